//! Crisis resources shown next to SOS results.

use std::fmt::Write;

use speakup_shared::constants::{CRISIS_HOTLINES, EMERGENCY_NUMBER, SAFETY_STEPS};

/// Hotlines and safety steps as plain text, one item per line.
pub fn support_resources() -> String {
    let mut out = format!("If you are in immediate danger, call {EMERGENCY_NUMBER}.\n\nCrisis hotlines:\n");
    for hotline in CRISIS_HOTLINES {
        let _ = writeln!(
            out,
            "  {}: {} ({})",
            hotline.name, hotline.contact, hotline.available
        );
    }

    out.push_str("\nSafety steps:\n");
    for (i, step) in SAFETY_STEPS.iter().enumerate() {
        let _ = writeln!(out, "  {}. {step}", i + 1);
    }
    out
}
