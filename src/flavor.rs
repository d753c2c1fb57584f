use rand::Rng;

use crate::mood::Mood;
use crate::persona::Persona;
use crate::provider::CompletionRequest;
use crate::snapshot::StatSnapshot;

/// How many lines to request per refresh.
pub const FLAVOR_BATCH_SIZE: usize = 7;
/// Replenish opportunistically when fewer than this many lines remain.
pub const LOW_WATER_MARK: usize = 2;

const MIN_LINE_CHARS: usize = 2;
const MAX_LINE_CHARS: usize = 100;

// Static fallback lines, keyed by persona and mood. `{user}` is replaced
// with the display name at draw time.
const MIKA_HAPPY: &[&str] = &[
    "Nyaa~! Feeling great!",
    "*purrrr*",
    "Hehe~ ♡",
    "Everything's perfect with {user}!",
];
const MIKA_PLAYFUL: &[&str] = &[
    "Let's play, {user}!",
    "*bounces*",
    "Ready for fun!",
    "Tease time? 😉",
];
const MIKA_NEEDY: &[&str] = &[
    "{user}...",
    "Pay attention to me!",
    "Headpats? <.<",
    "Don't ignore me! >.<",
];
const MIKA_GRUMPY: &[&str] = &["Hmph!", "*pout*", "Not happy right now...", "Need something..."];
const MIKA_SLEEPY: &[&str] = &["*yawn*", "Sleepy kitty...", "Nap time soon?", "Zzzz..."];
const MIKA_HUNGRY: &[&str] = &["Tummy rumbles...", "Feed me, {user}!", "Snack time? Nyaa~!"];
const MIKA_GENERIC: &[&str] = &["Nyaa~?", "{user}?", "*swishes tail*", "..."];

const KANA_CONTENT: &[&str] = &["...", "*stares*", "Fine.", "Acceptable state."];
const KANA_GRUMPY: &[&str] = &["*Sigh*", "Annoyed.", "What now?", "Leave me alone."];
const KANA_SLEEPY: &[&str] = &["Tired.", "Need sleep.", "Don't bother me.", "Zzz."];
const KANA_HUNGRY: &[&str] = &["Feed me.", "Hungry.", "Food. Now.", "{user}. Sustenance."];
const KANA_GENERIC: &[&str] = &["...", "{user}?", "*slight ear twitch*", "Hmph."];

fn fallback_bucket(persona: Persona, mood: Mood) -> &'static [&'static str] {
    match persona {
        Persona::Mika => match mood {
            Mood::Happy => MIKA_HAPPY,
            Mood::Playful => MIKA_PLAYFUL,
            Mood::Needy => MIKA_NEEDY,
            Mood::Grumpy => MIKA_GRUMPY,
            Mood::Sleepy => MIKA_SLEEPY,
            Mood::Hungry => MIKA_HUNGRY,
            Mood::Content => MIKA_GENERIC,
        },
        Persona::Kana => match mood {
            Mood::Content => KANA_CONTENT,
            Mood::Grumpy => KANA_GRUMPY,
            Mood::Sleepy => KANA_SLEEPY,
            Mood::Hungry => KANA_HUNGRY,
            _ => KANA_GENERIC,
        },
    }
}

/// Ephemeral rotating pool of short persona lines, replenished from the
/// text-completion service without over-requesting.
#[derive(Debug, Default)]
pub struct FlavorTextCache {
    lines: Vec<String>,
    fetch_in_flight: bool,
}

impl FlavorTextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_in_flight
    }

    /// Claims the single fetch slot. Returns false when a request is
    /// already in flight, collapsing concurrent trigger conditions into
    /// one outstanding call.
    pub fn begin_fetch(&mut self) -> bool {
        if self.fetch_in_flight {
            return false;
        }
        self.fetch_in_flight = true;
        true
    }

    /// Applies a successful service response. The cache is replaced
    /// wholesale when the response parses into at least one usable line;
    /// otherwise the existing (stale-but-valid) lines stay.
    pub fn complete_fetch(&mut self, response: &str) -> usize {
        self.fetch_in_flight = false;
        let parsed = parse_lines(response);
        let count = parsed.len();
        if count > 0 {
            self.lines = parsed;
        }
        count
    }

    pub fn fail_fetch(&mut self) {
        self.fetch_in_flight = false;
    }

    /// Drops everything, including the busy flag. Used on persona switch.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.fetch_in_flight = false;
    }

    pub fn below_low_water(&self) -> bool {
        self.lines.len() < LOW_WATER_MARK
    }

    /// Returns one display line: cache-preferred, consuming the drawn
    /// line, else a mood-appropriate static fallback. An active incident
    /// forces the grumpy fallback bucket. Never returns an empty string.
    pub fn next_line(
        &mut self,
        persona: Persona,
        mood: Mood,
        incident_active: bool,
        user_name: &str,
    ) -> String {
        let mut rng = rand::thread_rng();
        let raw = if self.lines.is_empty() {
            let effective_mood = if incident_active { Mood::Grumpy } else { mood };
            let bucket = fallback_bucket(persona, effective_mood);
            bucket[rng.gen_range(0..bucket.len())].to_string()
        } else {
            let index = rng.gen_range(0..self.lines.len());
            self.lines.swap_remove(index)
        };
        raw.replace("{user}", user_name)
    }
}

/// Splits a service response into usable short lines: one per line break,
/// list markers stripped, anything outside the sane length window dropped.
pub fn parse_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(strip_list_marker)
        .map(str::trim)
        .filter(|line| {
            let chars = line.chars().count();
            chars >= MIN_LINE_CHARS && chars <= MAX_LINE_CHARS
        })
        .map(|line| line.to_string())
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    let without_digits = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() < trimmed.len() {
        // "3. message" or "3) message"
        without_digits
            .strip_prefix('.')
            .or_else(|| without_digits.strip_prefix(')'))
            .unwrap_or(trimmed)
    } else {
        // "- message" or "* message"
        trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .unwrap_or(trimmed)
    }
}

/// Builds the refresh prompt from the persona, user, and current state.
/// During an incident the generated lines must deny responsibility and
/// blame the other persona.
pub fn build_refresh_request(
    persona: Persona,
    user_name: &str,
    snapshot: &StatSnapshot,
    mood: Mood,
) -> CompletionRequest {
    let stats = &snapshot.stats;
    let mut prompt = format!(
        "[ROLE: Generate {count} short, random messages for a Tamagotchi-like character.] \
         Character: {persona} ({desc}) Interacting with: {user} \
         Current State: Mood: {mood}, Hunger: {hunger:.0}/100, Happiness: {happiness:.0}/100, \
         Energy: {energy:.0}/100, Affection towards {user}: {affection:.0}/100, \
         Memory from yesterday: {memory}, Napping: {napping}.",
        count = FLAVOR_BATCH_SIZE,
        persona = persona,
        desc = persona.description(),
        user = user_name,
        mood = mood,
        hunger = stats.hunger,
        happiness = stats.happiness,
        energy = stats.energy,
        affection = stats.affection,
        memory = snapshot.last_memory,
        napping = snapshot.is_napping,
    );

    if snapshot.incident_active {
        let blame = snapshot.incident_blame.unwrap_or_else(|| persona.other());
        prompt.push_str(&format!(
            " IMPORTANT: A mess appeared overnight. {persona} absolutely did not do it. \
             Every message must deny responsibility and blame {blame} for the mess.",
        ));
    }

    prompt.push_str(&format!(
        " Instructions: Generate a list of {count} distinct, short (5-15 words) messages \
         that {persona} might say randomly, reflecting their personality and current \
         state/memory. Address {user} directly. Format as a simple numbered list. \
         Output ONLY the list.",
        count = FLAVOR_BATCH_SIZE,
        persona = persona,
        user = user_name,
    ));

    CompletionRequest::bare(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_strips_numbered_list_markers() {
        let response = "1. Nyaa~! Hello!\n2) Feed me please!\n- Bullet line here\n* Star line here";
        let lines = parse_lines(response);
        assert_eq!(
            lines,
            vec![
                "Nyaa~! Hello!",
                "Feed me please!",
                "Bullet line here",
                "Star line here"
            ]
        );
    }

    #[test]
    fn test_parse_drops_lines_outside_length_window() {
        let long = "x".repeat(150);
        let response = format!("1. ok line\n2. a\n3. {}\n\n4. another fine line", long);
        let lines = parse_lines(&response);
        assert_eq!(lines, vec!["ok line", "another fine line"]);
    }

    #[test]
    fn test_failed_fetch_keeps_stale_cache() {
        let mut cache = FlavorTextCache::new();
        assert!(cache.begin_fetch());
        cache.complete_fetch("1. first line\n2. second line");
        assert_eq!(cache.len(), 2);

        assert!(cache.begin_fetch());
        cache.fail_fetch();
        assert_eq!(cache.len(), 2);
        assert!(!cache.is_fetching());
    }

    #[test]
    fn test_unusable_response_keeps_stale_cache() {
        let mut cache = FlavorTextCache::new();
        cache.begin_fetch();
        cache.complete_fetch("1. keep me around\n2. also keep me");
        cache.begin_fetch();
        let count = cache.complete_fetch("a\n\n");
        assert_eq!(count, 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_single_fetch_slot() {
        let mut cache = FlavorTextCache::new();
        assert!(cache.begin_fetch());
        assert!(!cache.begin_fetch());
        cache.fail_fetch();
        assert!(cache.begin_fetch());
    }

    #[test]
    fn test_next_line_substitutes_user_name() {
        let mut cache = FlavorTextCache::new();
        cache.begin_fetch();
        cache.complete_fetch("1. Hello {user}, play with me!");
        let line = cache.next_line(Persona::Mika, Mood::Content, false, "Sam");
        assert_eq!(line, "Hello Sam, play with me!");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fallback_never_empty_across_all_moods() {
        let mut cache = FlavorTextCache::new();
        let moods = [
            Mood::Sleepy,
            Mood::Grumpy,
            Mood::Hungry,
            Mood::Needy,
            Mood::Playful,
            Mood::Happy,
            Mood::Content,
        ];
        for _ in 0..100 {
            for persona in [Persona::Mika, Persona::Kana] {
                for mood in moods {
                    for incident in [false, true] {
                        let line = cache.next_line(persona, mood, incident, "Sam");
                        assert!(!line.is_empty());
                        assert!(!line.contains("{user}"));
                    }
                }
            }
        }
    }

    #[test]
    fn test_incident_prompt_blames_the_other_persona() {
        let mut snapshot = StatSnapshot::fresh(Utc::now());
        snapshot.incident_active = true;
        snapshot.incident_blame = Some(Persona::Kana);

        let request = build_refresh_request(Persona::Mika, "Sam", &snapshot, Mood::Grumpy);
        assert!(request.prompt.contains("blame Kana"));
        assert!(request.prompt.contains("deny responsibility"));
    }

    #[test]
    fn test_ordinary_prompt_has_no_blame_clause() {
        let snapshot = StatSnapshot::fresh(Utc::now());
        let request = build_refresh_request(Persona::Kana, "Sam", &snapshot, Mood::Content);
        assert!(!request.prompt.contains("blame"));
        assert!(request.prompt.contains("Kana"));
        assert!(request.prompt.contains("Sam"));
    }
}
