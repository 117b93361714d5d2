//! Plain-text presentation of engine results for the console adapter.

use crate::domain::model::{
    Card, MessageResolution, RequestKind, ResolutionOutcome, ResolvedRequest, Ruling,
};

const MAX_RULINGS_SHOWN: usize = 10;
const MAX_RULING_CHARS: usize = 1024;

pub fn render_resolution(resolution: &MessageResolution) -> Vec<String> {
    match resolution {
        MessageResolution::Ignored => Vec::new(),
        MessageResolution::Rejected(reason) => vec![reason.to_string()],
        MessageResolution::Resolved(results) => results.iter().map(render_resolved).collect(),
    }
}

pub fn render_resolved(resolved: &ResolvedRequest) -> String {
    let request = &resolved.request;
    match &resolved.outcome {
        ResolutionOutcome::Found {
            card,
            closest_match,
        } => {
            let mut text = render_card(card);
            if *closest_match {
                text.push_str(&format!("\n(closest match for '{}')", request.term()));
            } else if !request.filters().is_empty() && request.kind() == RequestKind::NamedLookup {
                text.push_str(&format!("\n(filtered result for '{}')", request.search_query()));
            }
            text
        }
        ResolutionOutcome::Ambiguous { candidates } => format!(
            "Multiple cards match '{}': {}",
            request.term(),
            candidates.join(", ")
        ),
        ResolutionOutcome::NotFound => match request.kind() {
            RequestKind::RandomPick if !request.filters().is_empty() => format!(
                "No cards found matching filters: '{}'. Try broader criteria.",
                request.search_query()
            ),
            RequestKind::RandomPick => "No random card came back, try again.".to_string(),
            RequestKind::RulesLookup => {
                format!("Card '{}' not found for rules lookup.", request.term())
            }
            RequestKind::NamedLookup if !request.filters().is_empty() => format!(
                "No cards found for '{}'. Try simpler filters like `e:set` or `is:foil`, or check the spelling.",
                request.search_query()
            ),
            RequestKind::NamedLookup => format!(
                "Card '{}' not found. Try partial names like 'bolt' for 'Lightning Bolt'.",
                request.term()
            ),
        },
        ResolutionOutcome::RulingsFound {
            card,
            rulings,
            closest_match,
        } => {
            let mut text = render_rulings(card, rulings);
            if *closest_match {
                text.push_str(&format!("\n(closest match for '{}')", request.term()));
            }
            text
        }
        ResolutionOutcome::TransportError(kind) => kind.user_message().to_string(),
    }
}

fn render_card(card: &Card) -> String {
    let mut lines = vec![card.display_name()];

    let mut cost_line = Vec::new();
    if !card.mana_cost.is_empty() {
        cost_line.push(format!("Mana Cost: {}", card.mana_cost));
    }
    if let Some(price) = card.price_display() {
        cost_line.push(format!("Cost: {}", price));
    }
    if !cost_line.is_empty() {
        lines.push(cost_line.join(" - "));
    }
    if !card.type_line.is_empty() {
        lines.push(card.type_line.clone());
    }
    if !card.oracle_text.is_empty() {
        lines.push(card.oracle_text.clone());
    }
    if let Some(legal) = card.format_legalities() {
        lines.push(format!("Legal in: {}", legal));
    }
    if !card.set_name.is_empty() {
        lines.push(format!(
            "{} ({}) • {}",
            card.set_name,
            card.set_code.to_uppercase(),
            title_case(&card.rarity)
        ));
    }
    if let Some(image) = card.best_image_url() {
        lines.push(image.to_string());
    } else if !card.scryfall_uri.is_empty() {
        lines.push(card.scryfall_uri.clone());
    }
    lines.join("\n")
}

fn render_rulings(card: &Card, rulings: &[Ruling]) -> String {
    let name = card.display_name();
    if rulings.is_empty() {
        return format!("No official rulings found for {}.", name);
    }

    let mut lines = vec![format!("Rulings for {}:", name)];
    for ruling in rulings.iter().take(MAX_RULINGS_SHOWN) {
        let source = if ruling.source == "wotc" {
            "Wizards"
        } else {
            "Scryfall"
        };
        let date = if ruling.published_at.is_empty() {
            "Unknown date"
        } else {
            ruling.published_at.as_str()
        };
        lines.push(format!("- {} ({}): {}", source, date, truncate(&ruling.comment)));
    }
    if rulings.len() > MAX_RULINGS_SHOWN {
        lines.push(format!(
            "Showing {} of {} rulings.",
            MAX_RULINGS_SHOWN,
            rulings.len()
        ));
    } else {
        lines.push(format!("{} ruling(s) found.", rulings.len()));
    }
    lines.join("\n")
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_RULING_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_RULING_CHARS - 3).collect();
    format!("{}...", cut)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn help_text(prefix: &str) -> String {
    [
        "MTG Card Bot".to_string(),
        format!("{}lightning bolt         single-card lookup", prefix),
        "[[Lightning Bolt]]        bracket style lookup".to_string(),
        format!("{}rules counterspell     official rulings", prefix),
        format!("{}random e:mh3           random card, filters optional", prefix),
        format!("{}bolt; counterspell     several cards at once", prefix),
        "Filters: e:mh3 is:foil rarity:mythic cmc>=3 -t:creature".to_string(),
        "Sorting: order:usd dir:desc".to_string(),
    ]
    .join("\n")
}
