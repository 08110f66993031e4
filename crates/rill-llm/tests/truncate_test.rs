use rill_llm::truncate::{estimate_message_tokens, estimate_tokens, truncate_to_budget};
use rill_llm::{Content, ContentPart, Message};

fn text_of_len(n: usize) -> String {
    "x".repeat(n)
}

#[test]
fn test_estimate_rounds_up() {
    assert_eq!(estimate_message_tokens(&Message::human("abcd")), 1);
    assert_eq!(estimate_message_tokens(&Message::human("abcde")), 2);
    assert_eq!(estimate_message_tokens(&Message::human("")), 0);
}

#[test]
fn test_estimate_sums_text_parts() {
    let message = Message::Human {
        content: Content::Parts(vec![
            ContentPart::Text { text: "abcd".into() },
            ContentPart::Text { text: "efgh".into() },
        ]),
    };
    assert_eq!(estimate_message_tokens(&message), 2);
}

#[test]
fn test_estimate_is_monotonic_under_concatenation() {
    let a = vec![Message::human("hello there"), Message::ai("hi")];
    let b = vec![Message::human(text_of_len(37))];

    let mut combined = a.clone();
    combined.extend(b.clone());

    assert_eq!(
        estimate_tokens(&combined),
        estimate_tokens(&a) + estimate_tokens(&b)
    );
}

#[test]
fn test_system_prompt_always_kept() {
    let messages = vec![
        Message::system(text_of_len(20)), // 5 tokens
        Message::human(text_of_len(40)),  // 10 tokens
        Message::ai(text_of_len(40)),     // 10 tokens
    ];

    let kept = truncate_to_budget(&messages, 16, true);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].role(), "system");
    assert_eq!(kept[1].role(), "assistant");
}

#[test]
fn test_system_prompt_not_reserved_without_flag() {
    let messages = vec![
        Message::system(text_of_len(20)),
        Message::human(text_of_len(40)),
    ];

    let kept = truncate_to_budget(&messages, 16, false);
    // Newest-first walk: human (10) fits, system (5) fits too
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].role(), "system");
}

#[test]
fn test_stops_at_first_message_that_does_not_fit() {
    let messages = vec![
        Message::human(text_of_len(4)),   // 1 token, would fit but is behind the miss
        Message::ai(text_of_len(400)),    // 100 tokens, does not fit
        Message::human(text_of_len(40)),  // 10 tokens
    ];

    let kept = truncate_to_budget(&messages, 25, false);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0], messages[2]);
}

#[test]
fn test_output_preserves_chronological_order() {
    let messages = vec![
        Message::system("s"),
        Message::human("one"),
        Message::ai("two"),
        Message::human("three"),
    ];

    let kept = truncate_to_budget(&messages, 1000, true);
    assert_eq!(kept, messages);
}

#[test]
fn test_zero_budget_keeps_nothing_but_reserved_system() {
    let messages = vec![Message::system("rules"), Message::human("hi")];

    assert!(truncate_to_budget(&messages, 0, false).is_empty());

    let kept = truncate_to_budget(&messages, 0, true);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].role(), "system");
}
