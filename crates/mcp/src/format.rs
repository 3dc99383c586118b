// Human-readable rendering of normalized items

use chrono::Utc;
use hotsearch_core::NormalizedItem;

/// Render items as a markdown block under `heading`.
pub fn format_items(items: &[NormalizedItem], heading: &str) -> String {
    let mut output = format!("## {}\n\n", heading);

    if items.is_empty() {
        output.push_str("No data\n");
        return output;
    }

    for item in items {
        output.push_str(&render_item(item));
        output.push('\n');
    }

    output.push_str(&format!(
        "*Generated at: {}*\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output
}

fn render_item(item: &NormalizedItem) -> String {
    let mut lines = vec![
        format!("### {}. {}", item.rank, item.title),
        format!("- **Hotness**: {}", item.score),
        format!("- **Trend**: {}", item.trend),
    ];
    if let Some(description) = &item.description {
        lines.push(format!("- **Description**: {}", description));
    }
    if !item.link.is_empty() {
        lines.push(format!("- **Link**: {}", item.link));
    }

    let mut block = lines.join("\n");
    block.push('\n');
    block
}
