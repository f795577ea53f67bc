//! Summary card for a game token, composed as SVG and rasterised to PNG.

use crate::{
    Result,
    presentation::GameSummary,
    status::GameStatus,
};
use anyhow::{
    Context,
    anyhow,
};
use resvg::{
    tiny_skia,
    usvg,
};
use std::{
    fmt::Write,
    sync::Arc,
};

pub const IMAGE_WIDTH: u32 = 630;
pub const IMAGE_HEIGHT: u32 = 1200;

const FONT_FAMILY: &str = "ui-monospace, Monaco, Consolas, DejaVu Sans Mono, monospace";

/// Background stops (offset, colour) selected solely by status.
fn gradient_stops(status: GameStatus) -> &'static [(u8, &'static str)] {
    match status {
        GameStatus::Active => &[
            (0, "#0a0a0f"),
            (25, "#0f172a"),
            (50, "#166534"),
            (85, "#ec4899"),
            (100, "#7c3aed"),
        ],
        GameStatus::Ended => &[
            (0, "#0a0a0f"),
            (40, "#1e1b4b"),
            (70, "#312e81"),
            (100, "#4c1d95"),
        ],
        GameStatus::Stale => &[
            (0, "#1c1917"),
            (40, "#44403c"),
            (70, "#78716c"),
            (100, "#b45309"),
        ],
    }
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Build the SVG document for `summary`. Pure; the same summary always gives
/// the same document.
pub fn summary_svg(summary: &GameSummary) -> String {
    let symbol = escape_xml(&summary.symbol);
    let creator_short = summary.creator_short();
    let bar_width = (320.0 * summary.round.fraction()).round() as u32;
    let w = IMAGE_WIDTH;
    let h = IMAGE_HEIGHT;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{FONT_FAMILY}">"#
    );
    svg.push_str(r#"<defs><linearGradient id="bg" x1="0" y1="0" x2="0" y2="1">"#);
    for (offset, colour) in gradient_stops(summary.status) {
        let _ = write!(svg, r#"<stop offset="{offset}%" stop-color="{colour}"/>"#);
    }
    svg.push_str(
        r#"</linearGradient><linearGradient id="amount" x1="0" y1="0" x2="1" y2="0"><stop offset="0%" stop-color="rgb(34,197,94)"/><stop offset="100%" stop-color="rgb(236,72,153)"/></linearGradient></defs>"#,
    );
    let _ = write!(svg, r#"<rect width="{w}" height="{h}" fill="url(#bg)"/>"#);

    // card
    svg.push_str(
        r#"<rect x="38" y="48" width="554" height="1104" rx="24" fill="black" fill-opacity="0.35" stroke="white" stroke-opacity="0.25" stroke-width="2"/>"#,
    );

    // title and amount
    let _ = write!(
        svg,
        r#"<text x="315" y="150" text-anchor="middle" font-size="44" font-weight="700" fill="white">{}</text>"#,
        escape_xml(&summary.title())
    );
    let _ = write!(
        svg,
        r#"<text x="315" y="200" text-anchor="middle" font-size="30" fill="url(#amount)">{} {symbol}</text>"#,
        escape_xml(&summary.amount)
    );

    // round ring and progress bar
    svg.push_str(
        r#"<circle cx="315" cy="450" r="136" fill="none" stroke="white" stroke-opacity="0.25" stroke-width="8"/>"#,
    );
    let _ = write!(
        svg,
        r#"<text x="315" y="470" text-anchor="middle" font-size="56" font-weight="700" fill="white">{}</text>"#,
        summary.round.compact()
    );
    svg.push_str(
        r#"<rect x="155" y="620" width="320" height="20" rx="10" fill="black" fill-opacity="0.4"/>"#,
    );
    if bar_width > 0 {
        let _ = write!(
            svg,
            r#"<rect x="155" y="620" width="{bar_width}" height="20" rx="10" fill="rgb(34,197,94)" fill-opacity="0.9"/>"#
        );
    }

    // data boxes
    let rows = [
        format!("ID: {}", summary.token_id),
        format!(
            "Players: {} · Round {}",
            summary.player_count, summary.round
        ),
        format!("Pot: {} {} · {}", summary.pot, summary.symbol, summary.status),
        format!("Created: {} · {}", summary.created, creator_short),
    ];
    for (i, row) in rows.iter().enumerate() {
        let y = 820 + i as u32 * 76;
        let _ = write!(
            svg,
            r#"<rect x="78" y="{y}" width="474" height="64" rx="8" fill="black" fill-opacity="0.5"/><text x="94" y="{}" font-size="20" fill="white">{}</text>"#,
            y + 40,
            escape_xml(row)
        );
    }

    // faint edge labels
    let _ = write!(
        svg,
        r#"<text x="24" y="{}" font-size="14" fill="white" fill-opacity="0.35">{}</text>"#,
        h - 16,
        escape_xml(&creator_short)
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="16" font-size="18" fill="white" fill-opacity="0.4" transform="rotate(90 {} 16)">{symbol}</text>"#,
        w - 24,
        w - 24
    );
    svg.push_str("</svg>");
    svg
}

/// Rasterises summary cards. Loads the system font database once; cheap to
/// clone and share between request handlers.
#[derive(Clone)]
pub struct ImageRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for ImageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageRenderer {
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!("loaded {} font faces for image rendering", fontdb.len());
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    pub fn render_png(&self, summary: &GameSummary) -> Result<Vec<u8>> {
        let svg = summary_svg(summary);
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)
            .context("failed to parse summary image document")?;
        let mut pixmap = tiny_skia::Pixmap::new(IMAGE_WIDTH, IMAGE_HEIGHT)
            .ok_or_else(|| anyhow!("failed to allocate summary image"))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        pixmap.encode_png().context("failed to encode summary image")
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        assets::AssetMetadata,
        game::sample_record,
    };

    const NOW: u64 = 1_800_000_000;

    fn summary_with(status_ended: bool, symbol: &str) -> GameSummary {
        let mut record = sample_record(4);
        record.current_index = 1;
        record.total_deposited = 200_000000;
        record.last_updated_at = NOW - 10;
        record.ended = status_ended;
        GameSummary::build(&record, &AssetMetadata::new(symbol, 6), NOW)
    }

    #[test]
    fn summary_svg__contains_derived_fields() {
        // when
        let svg = summary_svg(&summary_with(false, "USDC"));

        // then
        assert!(svg.contains("Pasanaku #5"));
        assert!(svg.contains("100 USDC"));
        assert!(svg.contains(">2/4<"));
        assert!(svg.contains("Players: 4 · Round 2 of 4"));
        assert!(svg.contains("Pot: 200 USDC · Active"));
        assert!(svg.contains(r##"stop-color="#166534""##));
        assert!(svg.contains(r#"width="630" height="1200""#));
    }

    #[test]
    fn summary_svg__background_depends_on_status() {
        let active = summary_svg(&summary_with(false, "USDC"));
        let ended = summary_svg(&summary_with(true, "USDC"));
        assert!(ended.contains(r##"stop-color="#4c1d95""##));
        assert!(!active.contains(r##"stop-color="#4c1d95""##));
    }

    #[test]
    fn summary_svg__escapes_token_symbol() {
        let svg = summary_svg(&summary_with(false, "<b>&"));
        assert!(svg.contains("&lt;b&gt;&amp;"));
        assert!(!svg.contains("<b>&"));
    }

    #[test]
    fn render_png__produces_fixed_size_png() {
        // given
        let renderer = ImageRenderer::new();

        // when
        let png = renderer.render_png(&summary_with(false, "USDC")).unwrap();

        // then
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let width = u32::from_be_bytes(png[16..20].try_into().unwrap());
        let height = u32::from_be_bytes(png[20..24].try_into().unwrap());
        assert_eq!((width, height), (IMAGE_WIDTH, IMAGE_HEIGHT));
    }
}
