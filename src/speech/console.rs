use super::engine::{SynthesisEngine, SynthesisOutcome, Utterance, Voice};
use anyhow::Result;
use tokio::sync::oneshot;

/// Synthesis engine that writes utterances to stdout
///
/// Stand-in for a real text-to-speech engine in terminal environments; the
/// adapter and controller run the same code paths either way.
pub struct ConsoleSynthesis;

#[async_trait::async_trait]
impl SynthesisEngine for ConsoleSynthesis {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    async fn speak(&mut self, utterance: &Utterance) -> Result<oneshot::Receiver<SynthesisOutcome>> {
        println!("\n  \"{}\"\n", utterance.text);

        let (tx, rx) = oneshot::channel();
        let _ = tx.send(SynthesisOutcome::Finished);
        Ok(rx)
    }

    async fn cancel(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
