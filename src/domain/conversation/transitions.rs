//! Transition table of the conversation state machine.
//!
//! `transition` maps (state, event) to the action the engine must perform and
//! the state to commit afterwards. It performs no I/O, so every row of the
//! table is tested directly below.

use super::messages;
use super::{ConversationState, EventKind, FollowupAnswer, InboundEvent};

/// What the engine must do for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAction {
    /// Send a fixed message.
    Reply(&'static str),
    /// Store the diet, then send the confirmation.
    RecordDiet { diet: String },
    /// Ask the completion service about a text query.
    AnswerText { query: String },
    /// Resolve the image, then ask the completion service about it.
    AnswerImage {
        media_ref: String,
        caption: Option<String>,
    },
    /// Send the closing message and delete the session.
    Close,
}

impl TurnAction {
    /// True if the action calls the completion service.
    pub fn queries_ai(&self) -> bool {
        matches!(self, Self::AnswerText { .. } | Self::AnswerImage { .. })
    }
}

/// Where the session goes once the action completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    /// Keep the current state (re-prompts).
    Stay,
    /// Commit the given state. For AI actions only on success.
    Goto(ConversationState),
    /// Delete the session.
    End,
}

/// One row of the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub action: TurnAction,
    pub next: NextState,
}

impl Transition {
    fn reply(message: &'static str, next: NextState) -> Self {
        Self {
            action: TurnAction::Reply(message),
            next,
        }
    }
}

/// Looks up the transition for `event` arriving in `state`.
pub fn transition(state: ConversationState, event: &InboundEvent) -> Transition {
    use ConversationState::*;

    match state {
        Initial => Transition::reply(messages::GREETING, NextState::Goto(AwaitingDiet)),

        AwaitingDiet => match (event.kind, event.trimmed_text()) {
            (EventKind::Text, Some(diet)) => Transition {
                action: TurnAction::RecordDiet {
                    diet: diet.to_string(),
                },
                next: NextState::Goto(AwaitingQuery),
            },
            _ => Transition::reply(messages::DIET_REPROMPT, NextState::Stay),
        },

        AwaitingQuery => match event.kind {
            EventKind::Text => match event.trimmed_text() {
                Some(query) => Transition {
                    action: TurnAction::AnswerText {
                        query: query.to_string(),
                    },
                    next: NextState::Goto(AwaitingFollowup),
                },
                None => Transition::reply(messages::QUERY_REPROMPT, NextState::Stay),
            },
            EventKind::Image => match event.media_ref.as_deref().map(str::trim) {
                Some(media_ref) if !media_ref.is_empty() => Transition {
                    action: TurnAction::AnswerImage {
                        media_ref: media_ref.to_string(),
                        caption: event.trimmed_text().map(str::to_string),
                    },
                    next: NextState::Goto(AwaitingFollowup),
                },
                _ => Transition::reply(messages::UNSUPPORTED_KIND, NextState::Stay),
            },
            EventKind::Status | EventKind::Unknown => {
                Transition::reply(messages::UNSUPPORTED_KIND, NextState::Stay)
            }
        },

        AwaitingFollowup => {
            let answer = match event.kind {
                EventKind::Text => event.text.as_deref().and_then(FollowupAnswer::classify),
                _ => None,
            };
            match answer {
                Some(FollowupAnswer::Yes) => {
                    Transition::reply(messages::NEXT_QUERY, NextState::Goto(AwaitingQuery))
                }
                Some(FollowupAnswer::No) => Transition {
                    action: TurnAction::Close,
                    next: NextState::End,
                },
                None => Transition::reply(messages::YES_OR_NO, NextState::Stay),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StateMachine;
    use ConversationState::*;

    const USER: &str = "whatsapp:+5491100000000";

    fn sample_events() -> Vec<InboundEvent> {
        vec![
            InboundEvent::text(USER, "keto"),
            InboundEvent::text(USER, "   "),
            InboundEvent::text(USER, "sí"),
            InboundEvent::text(USER, "no"),
            InboundEvent::image(USER, "m1"),
            InboundEvent::image(USER, " "),
            InboundEvent::unknown(USER),
            InboundEvent::status(USER),
        ]
    }

    mod initial {
        use super::*;

        #[test]
        fn any_event_greets_and_asks_for_diet() {
            for event in sample_events() {
                let t = transition(Initial, &event);
                assert_eq!(t.action, TurnAction::Reply(messages::GREETING));
                assert_eq!(t.next, NextState::Goto(AwaitingDiet));
            }
        }
    }

    mod awaiting_diet {
        use super::*;

        #[test]
        fn non_empty_text_records_trimmed_diet() {
            let t = transition(AwaitingDiet, &InboundEvent::text(USER, "  vegana "));
            assert_eq!(
                t.action,
                TurnAction::RecordDiet {
                    diet: "vegana".to_string()
                }
            );
            assert_eq!(t.next, NextState::Goto(AwaitingQuery));
        }

        #[test]
        fn blank_text_reprompts() {
            let t = transition(AwaitingDiet, &InboundEvent::text(USER, " \n"));
            assert_eq!(t.action, TurnAction::Reply(messages::DIET_REPROMPT));
            assert_eq!(t.next, NextState::Stay);
        }

        #[test]
        fn non_text_reprompts() {
            for event in [InboundEvent::image(USER, "m1"), InboundEvent::unknown(USER)] {
                let t = transition(AwaitingDiet, &event);
                assert_eq!(t.action, TurnAction::Reply(messages::DIET_REPROMPT));
                assert_eq!(t.next, NextState::Stay);
            }
        }
    }

    mod awaiting_query {
        use super::*;

        #[test]
        fn text_asks_ai() {
            let t = transition(AwaitingQuery, &InboundEvent::text(USER, "¿arroz integral?"));
            assert_eq!(
                t.action,
                TurnAction::AnswerText {
                    query: "¿arroz integral?".to_string()
                }
            );
            assert_eq!(t.next, NextState::Goto(AwaitingFollowup));
        }

        #[test]
        fn empty_text_reprompts() {
            let t = transition(AwaitingQuery, &InboundEvent::text(USER, ""));
            assert_eq!(t.action, TurnAction::Reply(messages::QUERY_REPROMPT));
            assert_eq!(t.next, NextState::Stay);
        }

        #[test]
        fn image_asks_ai_with_media_ref_and_caption() {
            let event = InboundEvent::image(USER, "m1").with_text(" pan ");
            let t = transition(AwaitingQuery, &event);
            assert_eq!(
                t.action,
                TurnAction::AnswerImage {
                    media_ref: "m1".to_string(),
                    caption: Some("pan".to_string()),
                }
            );
            assert_eq!(t.next, NextState::Goto(AwaitingFollowup));
        }

        #[test]
        fn image_without_media_ref_is_unsupported() {
            let t = transition(AwaitingQuery, &InboundEvent::image(USER, "  "));
            assert_eq!(t.action, TurnAction::Reply(messages::UNSUPPORTED_KIND));
            assert_eq!(t.next, NextState::Stay);
        }

        #[test]
        fn unknown_kind_asks_for_text_or_image() {
            let t = transition(AwaitingQuery, &InboundEvent::unknown(USER));
            assert_eq!(t.action, TurnAction::Reply(messages::UNSUPPORTED_KIND));
            assert_eq!(t.next, NextState::Stay);
        }
    }

    mod awaiting_followup {
        use super::*;

        #[test]
        fn affirmative_returns_to_query() {
            for text in ["sí", "si\u{301}", "Si", "YES"] {
                let t = transition(AwaitingFollowup, &InboundEvent::text(USER, text));
                assert_eq!(t.action, TurnAction::Reply(messages::NEXT_QUERY));
                assert_eq!(t.next, NextState::Goto(AwaitingQuery));
            }
        }

        #[test]
        fn negative_closes() {
            let t = transition(AwaitingFollowup, &InboundEvent::text(USER, "No"));
            assert_eq!(t.action, TurnAction::Close);
            assert_eq!(t.next, NextState::End);
        }

        #[test]
        fn anything_else_asks_yes_or_no() {
            for event in [
                InboundEvent::text(USER, "tal vez"),
                InboundEvent::image(USER, "m1").with_text("sí"),
                InboundEvent::unknown(USER),
            ] {
                let t = transition(AwaitingFollowup, &event);
                assert_eq!(t.action, TurnAction::Reply(messages::YES_OR_NO));
                assert_eq!(t.next, NextState::Stay);
            }
        }
    }

    #[test]
    fn every_goto_is_a_legal_edge() {
        for state in ConversationState::ALL {
            for event in sample_events() {
                if let NextState::Goto(target) = transition(state, &event).next {
                    assert!(
                        state.can_transition_to(&target),
                        "{} -> {} is not a legal edge",
                        state,
                        target
                    );
                }
            }
        }
    }

    #[test]
    fn only_awaiting_query_produces_ai_actions() {
        for state in ConversationState::ALL {
            for event in sample_events() {
                let t = transition(state, &event);
                if t.action.queries_ai() {
                    assert!(state.can_query_ai());
                }
            }
        }
    }
}
