use handlebars::Handlebars;
use serde_json::json;

use super::NotifierError;
use crate::alerting::{Breach, Reading, ThresholdConfig};

const ZONE_ALERT_SUBJECT: &str = "⚠️ Temperature alert (thermal sensor)";

const ZONE_ALERT_EMAIL: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <style>
        body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 8px; }
        .header { background-color: #ffeaa7; padding: 15px; border-radius: 8px 8px 0 0; text-align: center; }
        .header h2 { margin: 0; color: #2d3436; }
        .badge { background-color: #d63031; color: white; padding: 5px 10px; border-radius: 4px; font-weight: bold; display: inline-block; margin-top: 10px; }
        .content { padding: 20px; }
        .footer { margin-top: 30px; font-size: 12px; color: #b2bec3; text-align: center; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h2>Temperature anomaly detected</h2>
            <div class="badge">{{direction}} threshold breached</div>
        </div>
        <div class="content">
            <p>{{reason}}</p>
            <p>
                <b>Camera:</b> {{camera_id}}<br>
                <b>Zone:</b> {{zone_id}}<br>
                <b>Current temperature:</b> {{temperature}}°C<br>
                <b>Lower threshold:</b> {{lower}}<br>
                <b>Upper threshold:</b> {{upper}}<br>
                <b>Date/Time:</b> {{timestamp}}<br>
            </p>
        </div>
        <div class="footer">
            <p>Sent by the thermal zone monitoring service</p>
        </div>
    </div>
</body>
</html>
"#;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

pub struct NotificationTemplates {
    registry: Handlebars<'static>,
}

impl NotificationTemplates {
    pub fn new() -> Result<Self, NotifierError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string("zone_alert", ZONE_ALERT_EMAIL)
            .map_err(|e| NotifierError::Template(e.to_string()))?;
        Ok(Self { registry })
    }

    /// Renders the HTML email for a breached zone threshold.
    pub fn zone_alert_email(
        &self,
        config: &ThresholdConfig,
        reading: &Reading,
        breach: &Breach,
    ) -> Result<RenderedMessage, NotifierError> {
        let data = json!({
            "direction": breach.direction.as_str().to_uppercase(),
            "reason": breach.reason(reading.temperature),
            "camera_id": reading.camera_id,
            "zone_id": config.zone_id.to_string(),
            "temperature": format!("{:.2}", reading.temperature),
            "lower": format_threshold(config.lower_thresh),
            "upper": format_threshold(config.upper_thresh),
            "timestamp": reading.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        });

        let body = self
            .registry
            .render("zone_alert", &data)
            .map_err(|e| NotifierError::Template(e.to_string()))?;

        Ok(RenderedMessage {
            subject: ZONE_ALERT_SUBJECT.to_string(),
            body,
        })
    }
}

fn format_threshold(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}°C", v),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::evaluate_breach;
    use crate::zone::ZoneId;
    use chrono::NaiveDate;

    #[test]
    fn zone_alert_email_lists_reading_and_band() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        let config = ThresholdConfig {
            id: uuid::Uuid::new_v4(),
            zone_id: ZoneId::from_legacy(4),
            upper_thresh: Some(30.0),
            lower_thresh: None,
            recipient: "ops@example.com".to_string(),
            created_at: ts,
            updated_at: ts,
        };
        let reading = Reading {
            camera_id: 9,
            zone_id: config.zone_id,
            temperature: 41.256,
            timestamp: ts,
        };
        let breach = evaluate_breach(&config, reading.temperature).unwrap();

        let msg = NotificationTemplates::new()
            .unwrap()
            .zone_alert_email(&config, &reading, &breach)
            .unwrap();

        assert!(msg.subject.contains("Temperature alert"));
        assert!(msg.body.contains("<b>Camera:</b> 9"));
        assert!(msg.body.contains(&config.zone_id.to_string()));
        assert!(msg.body.contains("41.26°C"));
        assert!(msg.body.contains("<b>Lower threshold:</b> none"));
        assert!(msg.body.contains("<b>Upper threshold:</b> 30.00°C"));
        assert!(msg.body.contains("2025-03-04 05:06:07"));
        assert!(msg.body.contains("UPPER threshold breached"));
        assert!(msg.body.contains("above the upper threshold"));
    }
}
