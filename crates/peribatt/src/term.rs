//! Terminal render sink — what `watch` prints for each refresh cycle.

use peribatt_lib::render::{IndicatorSegment, RenderFrame, RenderSink};

/// Prints each presented frame to stdout.
///
/// Text mode writes the indicator line the way a panel would show it; JSON
/// mode writes one compact object per frame, suitable for piping.
pub struct TerminalSink {
    json: bool,
}

impl TerminalSink {
    pub fn new(json: bool) -> Self {
        TerminalSink { json }
    }
}

impl RenderSink for TerminalSink {
    fn present(&mut self, frame: &RenderFrame) {
        if self.json {
            println!("{}", serde_json::to_string(frame).unwrap());
            return;
        }
        if frame.segments.is_empty() {
            println!("  (indicator empty)");
            return;
        }
        let line = frame
            .segments
            .iter()
            .map(segment_text)
            .collect::<Vec<_>>()
            .join("   ");
        println!("  {line}");
    }
}

/// One segment as `label [icon]`, with a `+` mark while charging.
fn segment_text(segment: &IndicatorSegment) -> String {
    let mark = if segment.charging { "+" } else { "" };
    format!("{}{mark} [{}]", segment.label, segment.icon)
}
