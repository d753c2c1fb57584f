use colored::*;

use crate::persona::Persona;
use crate::session::RenderState;

const BAR_WIDTH: usize = 20;

fn stat_bar(value: f64) -> String {
    let filled = ((value / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "{}{} {:>3.0}/100",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        value
    )
}

/// Full status block printed for the status and do commands.
pub fn print_render_state(persona: Persona, state: &RenderState) {
    println!("{}", format!("{} Status", persona).cyan().bold());
    println!(
        "Mood: {} {}",
        state.mood,
        state.mood.emoji(persona)
    );
    if state.is_napping {
        println!("{}", "💤 Napping...".blue());
    }
    if state.incident_active {
        println!(
            "{}",
            "⚠️  There's a mess! Clean it up before anything else.".red()
        );
    }

    println!("\n{}", "Stats".cyan().bold());
    println!("Hunger    🍖 {}", stat_bar(state.hunger));
    println!("Happy     ✨ {}", stat_bar(state.happiness));
    println!("Energy    ⚡ {}", stat_bar(state.energy));
    println!("Affection ♡  {}", stat_bar(state.affection));

    println!(
        "\nDaily tasks: {}/{}  Streak: {} days",
        state.tasks_done, state.tasks_total, state.streak_count
    );

    if !state.display_line.is_empty() {
        println!("\n{} {}", persona.to_string().magenta().bold(), "says:".magenta());
        println!("「{}」", state.display_line);
    }
}

/// Compact one-line view for the live tick loop.
pub fn format_tick_line(persona: Persona, state: &RenderState) -> String {
    format!(
        "{} {} | 🍖{:>3.0} ✨{:>3.0} ⚡{:>3.0} ♡{:>3.0} | {} ({}/{})",
        state.mood.emoji(persona),
        persona,
        state.hunger,
        state.happiness,
        state.energy,
        state.affection,
        state.mood,
        state.tasks_done,
        state.tasks_total,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;

    fn sample_state() -> RenderState {
        RenderState {
            hunger: 50.0,
            happiness: 100.0,
            energy: 0.0,
            affection: 72.5,
            mood: Mood::Content,
            is_napping: false,
            incident_active: false,
            display_line: String::new(),
            tasks_done: 2,
            tasks_total: 5,
            streak_count: 4,
        }
    }

    #[test]
    fn test_stat_bar_bounds() {
        assert!(stat_bar(0.0).starts_with("░"));
        assert!(stat_bar(100.0).starts_with("█"));
        assert!(stat_bar(100.0).contains("100/100"));
    }

    #[test]
    fn test_tick_line_mentions_mood_and_tasks() {
        let line = format_tick_line(Persona::Mika, &sample_state());
        assert!(line.contains("content"));
        assert!(line.contains("(2/5)"));
    }
}
