//! Occupancy report rendering

use pinwarden_core::{BoardSnapshot, ComponentRecord, Diagnostic, PinSpec};
use serde::Serialize;
use std::fmt;

#[derive(Serialize)]
struct JsonReport<'a> {
    boards: &'a [BoardSnapshot],
    warnings: &'a [Diagnostic],
}

pub fn render_json(
    boards: &[BoardSnapshot],
    warnings: &[Diagnostic],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport { boards, warnings })
}

pub fn render_text(boards: &[BoardSnapshot], warnings: &[Diagnostic]) -> String {
    TextReport { boards, warnings }.to_string()
}

struct TextReport<'a> {
    boards: &'a [BoardSnapshot],
    warnings: &'a [Diagnostic],
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.boards.is_empty() {
            writeln!(f, "No boards declared")?;
        }

        for board in self.boards {
            writeln!(f, "Board {} ({})", board.id, board.io)?;

            writeln!(f, "  Components: {}", board.register.len())?;
            for record in &board.register {
                writeln!(
                    f,
                    "    {:<16} {:<16} {}",
                    record.kind,
                    record.id.as_deref().unwrap_or("-"),
                    describe_pins(record)
                )?;
            }

            writeln!(f, "  Occupied: {}", board.occupied.len())?;
            for descriptor in &board.occupied {
                writeln!(f, "    {}", descriptor)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "Warnings: {}", self.warnings.len())?;
            for warning in self.warnings {
                writeln!(f, "  [{}] {}", warning.emitter, warning.message)?;
            }
        }

        Ok(())
    }
}

fn describe_pins(record: &ComponentRecord) -> String {
    let mut parts = Vec::new();
    if let Some(pin) = &record.pin {
        parts.push(format!("pin {}", pin));
    }
    if let Some(pins) = &record.pins {
        let rendered = match pins {
            PinSpec::Scalar(pin) => pin.to_string(),
            PinSpec::Sequence(pins) => format!(
                "[{}]",
                pins.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            ),
            PinSpec::Mapping(roles) => format!(
                "{{{}}}",
                roles
                    .iter()
                    .map(|(role, pin)| format!("{}: {}", role, pin))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        parts.push(format!("pins {}", rendered));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinwarden_core::{BoardId, PinValue, ResourceDescriptor};

    fn snapshot() -> BoardSnapshot {
        BoardSnapshot {
            id: BoardId::new("uno"),
            io: "Firmata".to_string(),
            debug: false,
            repl: false,
            register: vec![ComponentRecord {
                kind: "ShiftRegister".to_string(),
                id: None,
                pin: None,
                pins: Some(PinSpec::mapping([("data", 2u32), ("clock", 3)])),
            }],
            occupied: vec![ResourceDescriptor::pin(2), ResourceDescriptor::pin(3)],
        }
    }

    #[test]
    fn test_describe_pins() {
        let record = ComponentRecord {
            kind: "Led".to_string(),
            id: Some("rgb".to_string()),
            pin: Some(PinValue::Number(9)),
            pins: Some(PinSpec::sequence([10u32, 11])),
        };
        assert_eq!(describe_pins(&record), "pin 9 pins [10, 11]");
    }

    #[test]
    fn test_render_text() {
        let warnings = vec![Diagnostic {
            emitter: "Led".to_string(),
            message: "pin: 3 is already in use".to_string(),
            at: chrono::Utc::now(),
        }];
        let text = render_text(&[snapshot()], &warnings);

        assert!(text.starts_with("Board uno (Firmata)\n"));
        assert!(text.contains("pins {data: 2, clock: 3}"));
        assert!(text.contains("  Occupied: 2\n    pin: 2\n    pin: 3\n"));
        assert!(text.ends_with("Warnings: 1\n  [Led] pin: 3 is already in use\n"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_text(&[], &[]), "No boards declared\n");
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&[snapshot()], &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["boards"][0]["occupied"][1]["value"], 3);
        assert_eq!(value["boards"][0]["register"][0]["pins"]["clock"], 3);
        assert!(value["warnings"].as_array().unwrap().is_empty());
    }
}
