//! Alert email rendering.
//!
//! [`render_alert`] is a pure function of the recipient and the payload.
//! When the payload carries no location both bodies say so explicitly and
//! neither contains a map link.

use speakup_shared::constants::{APP_NAME, EMERGENCY_NUMBER};
use speakup_shared::{AlertPayload, EmergencyContact};

pub const ALERT_SUBJECT: &str = "🚨 EMERGENCY SOS ALERT";

const LOCATION_UNAVAILABLE: &str = "Location unavailable";

const HTML_STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; }
.container { max-width: 600px; margin: 0 auto; }
.header { background: #dc2626; color: white; padding: 20px; text-align: center; }
.content { background: #f9fafb; padding: 30px; }
.alert-box { background: #fef2f2; border-left: 4px solid #dc2626; padding: 15px; margin: 20px 0; }
.info-row { padding: 10px 0; border-bottom: 1px solid #e5e7eb; }
.button { display: inline-block; background: #dc2626; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 10px 5px; }
.steps { background: white; padding: 20px; border-radius: 8px; margin: 20px 0; }
.footer { text-align: center; padding: 20px; color: #6b7280; font-size: 12px; }";

/// Subject and both bodies of one recipient's alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAlert {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn render_alert(contact: &EmergencyContact, payload: &AlertPayload) -> RenderedAlert {
    RenderedAlert {
        subject: ALERT_SUBJECT.to_string(),
        html: render_html(contact, payload),
        text: render_text(contact, payload),
    }
}

fn immediate_actions(has_location: bool) -> Vec<String> {
    let mut steps = vec![
        "Try calling them immediately".to_string(),
        format!("If no response, contact emergency services ({EMERGENCY_NUMBER})"),
    ];
    if has_location {
        steps.push("Check their location using the map link".to_string());
    }
    steps.push("Alert other trusted individuals if needed".to_string());
    steps
}

fn render_text(contact: &EmergencyContact, payload: &AlertPayload) -> String {
    let location = match &payload.location {
        Some(loc) => format!(
            "Location: {}\nCoordinates: {}, {}",
            loc.maps_url(),
            loc.lat,
            loc.lng
        ),
        None => LOCATION_UNAVAILABLE.to_string(),
    };

    let steps = immediate_actions(payload.location.is_some())
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {step}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{ALERT_SUBJECT}\n\n\
         {name},\n\n\
         This is an automated emergency alert from {APP_NAME}.\n\n\
         Alert Time: {timestamp}\n\
         {location}\n\n\
         Someone who added you as an emergency contact needs immediate help.\n\n\
         IMMEDIATE ACTIONS:\n\
         {steps}\n\n\
         ---\n\
         {APP_NAME} Emergency Alert System\n",
        name = contact.name,
        timestamp = payload.timestamp,
    )
}

fn render_html(contact: &EmergencyContact, payload: &AlertPayload) -> String {
    let (location_block, map_button) = match &payload.location {
        Some(loc) => {
            let url = loc.maps_url();
            (
                format!(
                    "<div class=\"info-row\"><strong>Location:</strong><br/>\
                     Latitude: {lat}<br/>Longitude: {lng}<br/>\
                     <a href=\"{url}\" class=\"button\" style=\"color: white;\">📍 View on Google Maps</a></div>",
                    lat = loc.lat,
                    lng = loc.lng,
                ),
                format!(
                    "<a href=\"{url}\" class=\"button\" style=\"background: #2563eb; color: white;\">🗺️ View Location</a>"
                ),
            )
        }
        None => (
            format!("<p>{LOCATION_UNAVAILABLE}</p>"),
            String::new(),
        ),
    };

    let steps: String = immediate_actions(payload.location.is_some())
        .iter()
        .map(|step| format!("<li>{step}</li>"))
        .collect();

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><style>\n{HTML_STYLE}\n</style></head>\n\
         <body><div class=\"container\">\
         <div class=\"header\"><h1 style=\"margin: 0;\">{ALERT_SUBJECT}</h1></div>\
         <div class=\"content\">\
         <div class=\"alert-box\"><strong>⚠️ IMMEDIATE ATTENTION REQUIRED</strong>\
         <p>This is an automated emergency alert from {APP_NAME}.</p></div>\
         <p>Dear {name},</p>\
         <p>Someone who has added you as an emergency contact has activated an SOS alert and needs immediate help.</p>\
         <div class=\"info-row\"><strong>Alert Time:</strong><br/>{timestamp}</div>\
         {location_block}\
         <div class=\"steps\"><h3 style=\"color: #dc2626; margin-top: 0;\">Immediate Actions Required:</h3><ol>{steps}</ol></div>\
         <div style=\"text-align: center; margin: 30px 0;\">\
         <a href=\"tel:{EMERGENCY_NUMBER}\" class=\"button\" style=\"color: white;\">📞 Call {EMERGENCY_NUMBER}</a>{map_button}</div>\
         </div>\
         <div class=\"footer\"><p>This is an automated message from {APP_NAME} Emergency Alert System.</p>\
         <p><strong>{APP_NAME}</strong> - Supporting survivors, empowering voices</p></div>\
         </div></body>\n</html>\n",
        name = escape_html(&contact.name),
        timestamp = escape_html(&payload.timestamp),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakup_shared::GeoLocation;

    fn alex() -> EmergencyContact {
        EmergencyContact::new("Alex", "alex@example.com").unwrap()
    }

    fn payload(location: Option<GeoLocation>) -> AlertPayload {
        AlertPayload {
            contacts: vec![alex()],
            location,
            timestamp: "Monday, January 1, 2024 at 09:00:00 AM EST".into(),
        }
    }

    #[test]
    fn test_with_location_has_coordinates_and_map_link() {
        let alert = render_alert(&alex(), &payload(Some(GeoLocation::new(40.0, -73.0))));

        assert_eq!(alert.subject, ALERT_SUBJECT);
        for body in [&alert.html, &alert.text] {
            assert!(body.contains("https://www.google.com/maps?q=40,-73"));
            assert!(body.contains("Alex"));
            assert!(body.contains("Monday, January 1, 2024 at 09:00:00 AM EST"));
            assert!(!body.contains(LOCATION_UNAVAILABLE));
        }
        assert!(alert.text.contains("Coordinates: 40, -73"));
        assert!(alert.html.contains("Latitude: 40<br/>Longitude: -73"));
    }

    #[test]
    fn test_without_location_says_unavailable() {
        let alert = render_alert(&alex(), &payload(None));

        for body in [&alert.html, &alert.text] {
            assert!(body.contains(LOCATION_UNAVAILABLE));
            assert!(!body.contains("maps?q="));
        }
    }

    #[test]
    fn test_actions_are_numbered_in_text() {
        let alert = render_alert(&alex(), &payload(None));
        assert!(alert.text.contains("1. Try calling them immediately"));
        assert!(alert.text.contains("2. If no response, contact emergency services (911)"));
        assert!(alert.text.contains("3. Alert other trusted individuals if needed"));
    }

    #[test]
    fn test_html_escapes_user_text() {
        let contact = EmergencyContact::new("<b>Alex</b>", "alex@example.com").unwrap();
        let alert = render_alert(&contact, &payload(None));
        assert!(alert.html.contains("Dear &lt;b&gt;Alex&lt;/b&gt;,"));
        assert!(!alert.html.contains("<b>Alex</b>"));
    }

    #[test]
    fn test_each_recipient_is_greeted_by_name() {
        let sam = EmergencyContact::new("Sam", "sam@example.com").unwrap();
        let p = payload(None);
        assert!(render_alert(&sam, &p).text.contains("Sam,"));
        assert!(render_alert(&alex(), &p).text.contains("Alex,"));
    }
}
