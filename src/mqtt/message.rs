use chrono::NaiveDateTime;
use std::fmt;

/// An inbound publish, stamped on arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for MqttMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let preview: String = self.content.chars().take(20).collect();
        write!(f, "{} - {}: {}", self.timestamp, self.topic, preview)
    }
}

impl MqttMessage {
    pub fn from_topic(topic: String, content: String) -> Self {
        MqttMessage {
            topic,
            content,
            timestamp: chrono::Local::now().naive_local(),
        }
    }
}

/// Payload for an integer command group, e.g. `[1500, 1370, 1630]`
pub fn format_group(values: &[u16]) -> String {
    let joined: Vec<String> = values.iter().map(u16::to_string).collect();
    format!("[{}]", joined.join(", "))
}

/// Payload for the depth correction: shortest round-trip decimal text,
/// always with a fractional part or exponent (`0.0`, `-0.25`, `1e-17`)
pub fn format_correction(value: f64) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_render_as_bracketed_lists() {
        assert_eq!(format_group(&[1500, 1370, 1630]), "[1500, 1370, 1630]");
        assert_eq!(format_group(&[1100]), "[1100]");
        assert_eq!(format_group(&[]), "[]");
    }

    #[test]
    fn corrections_render_as_decimal_text() {
        assert_eq!(format_correction(0.0), "0.0");
        assert_eq!(format_correction(-1.0), "-1.0");
        assert_eq!(format_correction(-0.25), "-0.25");
        assert_eq!(format_correction(11.016), "11.016");
    }

    #[test]
    fn display_truncates_long_content() {
        let message = MqttMessage::from_topic(
            "/bar30/all".to_string(),
            "Depth: 1.234 m Temp: 12.80 C Pressure: 1100 mbar".to_string(),
        );
        let rendered = message.to_string();
        assert!(rendered.ends_with("/bar30/all: Depth: 1.234 m Temp:"));
        assert!(!rendered.contains("Pressure"));
    }
}
