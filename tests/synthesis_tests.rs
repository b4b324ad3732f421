// Synthesis adapter: resolve-once semantics, idempotent cancel, and voice
// selection against the engine's advertised voices.

mod support;

use interview_voice::speech::{SynthesisAdapter, SynthesisOutcome, Voice};
use std::sync::Arc;
use std::time::Duration;
use support::ScriptedSynthesis;

fn voice(name: &str, locale: &str) -> Voice {
    Voice {
        name: name.to_string(),
        locale: locale.to_string(),
    }
}

async fn until_speaking(adapter: &SynthesisAdapter) {
    for _ in 0..100 {
        if adapter.is_speaking() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("adapter never reported speaking");
}

#[tokio::test]
async fn speak_resolves_when_the_engine_finishes() {
    let (engine, handle) = ScriptedSynthesis::new();
    let adapter = SynthesisAdapter::new(Box::new(engine));

    adapter.speak("Tell me about yourself").await;

    assert_eq!(handle.spoken(), vec!["Tell me about yourself".to_string()]);
    assert!(!adapter.is_speaking());
}

#[tokio::test]
async fn cancel_resolves_an_in_progress_utterance() {
    let (engine, handle) = ScriptedSynthesis::new();
    handle.auto_finish(false);
    let adapter = Arc::new(SynthesisAdapter::new(Box::new(engine)));

    let speak = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.speak("A long question").await }
    });

    until_speaking(&adapter).await;
    adapter.cancel().await;
    speak.await.unwrap();

    assert!(!adapter.is_speaking());
    assert_eq!(handle.cancels(), 1);

    // Idempotent: a second cancel never reaches the engine
    adapter.cancel().await;
    assert_eq!(handle.cancels(), 1);
}

#[tokio::test]
async fn synthesis_failure_is_treated_as_completion() {
    let (engine, handle) = ScriptedSynthesis::new();
    handle.auto_finish(false);
    let adapter = Arc::new(SynthesisAdapter::new(Box::new(engine)));

    let speak = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.speak("Doomed utterance").await }
    });

    until_speaking(&adapter).await;
    handle
        .finish(SynthesisOutcome::Failed("audio device lost".to_string()))
        .await;

    // The flow never stalls on a synthesis error
    speak.await.unwrap();
    assert!(!adapter.is_speaking());
}

#[tokio::test]
async fn selected_voice_is_passed_to_the_engine() {
    let (engine, handle) = ScriptedSynthesis::new();
    handle.set_voices(vec![
        voice("Amelie", "fr-FR"),
        voice("Zarvox", "en-US"),
        voice("Daniel", "en-GB"),
    ]);
    let adapter = SynthesisAdapter::new(Box::new(engine));

    adapter.speak("Hello").await;

    assert_eq!(handle.voices_used(), vec![Some("Daniel".to_string())]);
}
