use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contributions longer than this are truncated. This is a gameplay rule
/// (short lines keep the story moving), not an input-size guard.
pub const MAX_LINE_CHARS: usize = 15;

/// A single accepted contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryLine {
    pub player_id: String,
    pub content: String,
    pub round: u32,
    pub created_at: DateTime<Utc>,
}

/// Turn-based story state for one room
///
/// Players contribute strictly in `player_order`; the turn pointer wraps to
/// 0 exactly when every player has contributed once, which ends the round.
/// Once `current_round` passes `max_round` the story is completed and
/// rejects everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String, // equals the owning room id
    pub room_id: String,
    pub player_order: Vec<String>,
    pub opening_prompt: String,
    pub lines: Vec<StoryLine>,
    pub max_round: u32,
    pub current_player_index: usize,
    pub current_round: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl Story {
    pub fn new(
        room_id: String,
        player_order: Vec<String>,
        opening_prompt: String,
        max_round: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: room_id.clone(),
            room_id,
            player_order,
            opening_prompt,
            lines: Vec::new(),
            max_round,
            current_player_index: 0,
            current_round: 1,
            completed: false,
            created_at: now,
            last_updated_at: now,
        }
    }

    /// The player whose contribution is currently accepted
    pub fn current_player(&self) -> Option<&str> {
        self.player_order
            .get(self.current_player_index)
            .map(String::as_str)
    }

    /// Appends a line if the story is open and it is this player's turn.
    ///
    /// Returns false without mutating anything otherwise. Accepted content
    /// is truncated to [`MAX_LINE_CHARS`] characters.
    pub fn add_line(&mut self, player_id: &str, content: &str) -> bool {
        if self.completed {
            return false;
        }

        match self.current_player() {
            Some(current) if current == player_id => {}
            _ => return false,
        }

        let content: String = content.chars().take(MAX_LINE_CHARS).collect();

        self.lines.push(StoryLine {
            player_id: player_id.to_string(),
            content,
            round: self.current_round,
            created_at: Utc::now(),
        });

        self.current_player_index = (self.current_player_index + 1) % self.player_order.len();

        // A wrap to index 0 means the rotation finished: close the round.
        if self.current_player_index == 0 {
            self.current_round += 1;

            if self.current_round > self.max_round {
                self.completed = true;
            }
        }

        self.last_updated_at = Utc::now();
        true
    }

    /// The opening prompt followed by every line in append order
    pub fn full_text(&self) -> String {
        let mut text = self.opening_prompt.clone();

        for line in &self.lines {
            text.push(' ');
            text.push_str(&line.content);
        }

        text
    }

    /// The prompt plus one joined string per round that has content
    pub fn text_by_round(&self) -> Vec<String> {
        let mut rounds = vec![self.opening_prompt.clone()];

        for round in 1..=self.max_round {
            let round_text = self
                .lines
                .iter()
                .filter(|line| line.round == round)
                .map(|line| line.content.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            if !round_text.is_empty() {
                rounds.push(round_text);
            }
        }

        rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn two_player_story(max_round: u32) -> Story {
        Story::new(
            "room-1".to_string(),
            vec!["alice".to_string(), "bob".to_string()],
            "Once upon a time...".to_string(),
            max_round,
        )
    }

    #[test]
    fn test_new_story_starts_at_round_one() {
        let story = two_player_story(3);

        assert_eq!(story.id, "room-1");
        assert_eq!(story.current_round, 1);
        assert_eq!(story.current_player_index, 0);
        assert_eq!(story.current_player(), Some("alice"));
        assert!(!story.completed);
        assert!(story.lines.is_empty());
    }

    #[test]
    fn test_out_of_turn_contribution_is_rejected() {
        let mut story = two_player_story(3);

        assert!(!story.add_line("bob", "hello"));

        assert!(story.lines.is_empty());
        assert_eq!(story.current_player(), Some("alice"));
        assert_eq!(story.current_round, 1);
    }

    #[test]
    fn test_unknown_player_is_rejected() {
        let mut story = two_player_story(3);

        assert!(!story.add_line("mallory", "hello"));
        assert!(story.lines.is_empty());
    }

    #[test]
    fn test_turn_advances_and_wraps() {
        let mut story = two_player_story(3);

        assert!(story.add_line("alice", "one"));
        assert_eq!(story.current_player(), Some("bob"));
        assert_eq!(story.current_round, 1);

        assert!(story.add_line("bob", "two"));
        // Full rotation: pointer wraps and the round increments.
        assert_eq!(story.current_player(), Some("alice"));
        assert_eq!(story.current_round, 2);
    }

    #[test]
    fn test_completion_after_max_rounds() {
        let mut story = two_player_story(3);

        for i in 0..3 {
            assert!(story.add_line("alice", &format!("a{i}")));
            assert!(story.add_line("bob", &format!("b{i}")));
        }

        // 2 players x 3 rounds = 6 accepted lines, then the story closes.
        assert!(story.completed);
        assert_eq!(story.lines.len(), 6);
        assert!(!story.add_line("alice", "too late"));
        assert_eq!(story.lines.len(), 6);
    }

    #[test]
    fn test_lines_are_tagged_with_their_round() {
        let mut story = two_player_story(2);

        story.add_line("alice", "r1a");
        story.add_line("bob", "r1b");
        story.add_line("alice", "r2a");

        let rounds: Vec<u32> = story.lines.iter().map(|line| line.round).collect();
        assert_eq!(rounds, vec![1, 1, 2]);
    }

    #[rstest]
    #[case("short", "short")]
    #[case("exactly 15 char", "exactly 15 char")]
    #[case("this one is definitely too long", "this one is def")]
    fn test_truncation_to_fifteen_chars(#[case] input: &str, #[case] stored: &str) {
        let mut story = two_player_story(3);

        assert!(story.add_line("alice", input));

        assert_eq!(story.lines[0].content, stored);
        assert!(story.lines[0].content.chars().count() <= MAX_LINE_CHARS);
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let mut story = two_player_story(3);

        story.add_line("alice", "éééééééééééééééééééé");

        assert_eq!(story.lines[0].content.chars().count(), MAX_LINE_CHARS);
    }

    #[test]
    fn test_full_text_concatenates_prompt_and_lines() {
        let mut story = two_player_story(3);

        story.add_line("alice", "the cat");
        story.add_line("bob", "ran away");

        assert_eq!(story.full_text(), "Once upon a time... the cat ran away");
    }

    #[test]
    fn test_text_by_round_groups_lines() {
        let mut story = two_player_story(2);

        story.add_line("alice", "a1");
        story.add_line("bob", "b1");
        story.add_line("alice", "a2");

        assert_eq!(
            story.text_by_round(),
            vec![
                "Once upon a time...".to_string(),
                "a1 b1".to_string(),
                "a2".to_string(),
            ]
        );
    }

    #[test]
    fn test_text_by_round_skips_empty_rounds() {
        let story = two_player_story(2);

        assert_eq!(story.text_by_round(), vec!["Once upon a time...".to_string()]);
    }
}
