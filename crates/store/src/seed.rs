//! Demo data for local development: a handful of Cardiff businesses, a
//! cold-outreach template with two variations, and one draft campaign.

use crate::lifecycle::NewCampaign;
use crate::store::{NewLead, NewTemplate, NewVariation, OutreachStore};
use outreach_core::types::SendingStrategy;
use tracing::info;
use uuid::Uuid;

impl OutreachStore {
    pub fn seed_demo_data(&self, user_id: Uuid) {
        let leads = [
            ("The Pot Bistro", "Sarah Williams", "sarah@thepotbistro.co.uk", "Restaurant"),
            ("Cardiff Plumbing Solutions", "Mike Davies", "mike@cardiffplumbing.co.uk", "Contractor"),
            ("Penarth Pet Supplies", "Emma Roberts", "emma@penarthpets.co.uk", "Retail"),
            ("Bay Fitness Studio", "James Thompson", "james@bayfitness.co.uk", "Health & Fitness"),
            ("Roath Locks Hair Salon", "Lisa Morgan", "lisa@roathlocks.co.uk", "Beauty"),
        ];

        let mut lead_ids = Vec::new();
        for (business, contact, email, industry) in leads {
            if let Ok(lead) = self.create_lead(NewLead {
                user_id,
                business_name: business.to_string(),
                contact_name: Some(contact.to_string()),
                email: email.to_string(),
                phone: None,
                address: None,
                industry: Some(industry.to_string()),
                tags: vec!["local".to_string()],
                notes: None,
                source: Some("Manual".to_string()),
            }) {
                lead_ids.push(lead.id);
            }
        }

        let template = self.create_template(NewTemplate {
            user_id,
            name: "Local business outreach".to_string(),
            subject: "A website for {{businessName}}?".to_string(),
            body: "Hi {{contactName}}, I build websites for local businesses...".to_string(),
            tone: "friendly".to_string(),
            target_industry: None,
        });

        let _ = self.add_variations(
            template.id,
            vec![
                NewVariation {
                    name: "PAS Format".to_string(),
                    subject: "Is {{businessName}} missing online customers?".to_string(),
                    body_html: "<p>Hi {{contactName}},</p><p>Most people search online before visiting. Without a site, {{businessName}} is invisible to them. I can fix that in a week.</p><p>Worth a quick chat?</p>".to_string(),
                    body_text: "Hi {{contactName}},\n\nMost people search online before visiting. Without a site, {{businessName}} is invisible to them. I can fix that in a week.\n\nWorth a quick chat?".to_string(),
                    framework: "PAS".to_string(),
                },
                NewVariation {
                    name: "Direct".to_string(),
                    subject: "Website for {{businessName}}".to_string(),
                    body_html: "<p>Hi {{contactName}},</p><p>I build fast, affordable websites for Cardiff businesses. Can I show you what {{businessName}} could look like online?</p>".to_string(),
                    body_text: "Hi {{contactName}},\n\nI build fast, affordable websites for Cardiff businesses. Can I show you what {{businessName}} could look like online?".to_string(),
                    framework: "Direct".to_string(),
                },
            ],
        );

        let _ = self.create_campaign(NewCampaign {
            user_id,
            template_id: template.id,
            name: "Cardiff locals - first touch".to_string(),
            description: Some("Initial outreach to local businesses without websites".to_string()),
            strategy: SendingStrategy::Balanced,
            emails_per_hour: 10,
            emails_per_day: 50,
            send_window_start: 9,
            send_window_end: 17,
            send_weekdays_only: true,
            scheduled_for: None,
            lead_ids,
        });

        info!("demo data seeded (5 leads, 1 template, 2 variations, 1 draft campaign)");
    }
}
