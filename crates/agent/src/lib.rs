use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use ivr_core::{
    advance, classify_intent, normalize_text, prompts, spoken_reply, ticket_sentence,
    train_timing_sentence, CallStage, DemoIdentifiers, Intent, Language, MenuOption, Route,
    Terminal, VoiceDocument, VoicePrompt,
};
use ivr_observability::AppMetrics;
use ivr_storage::RecordRepository;
use tracing::{error, info, instrument};

/// Fields the provider echoes back on every callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackInput {
    pub digits: Option<String>,
    pub call_sid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CallReply {
    pub stage: CallStage,
    pub next: CallStage,
    pub document: VoiceDocument,
}

#[derive(Clone)]
pub struct IvrAgent<S>
where
    S: RecordRepository,
{
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    demo_ids: DemoIdentifiers,
}

impl<S> IvrAgent<S>
where
    S: RecordRepository,
{
    pub fn new(store: Arc<S>, metrics: Arc<AppMetrics>, demo_ids: DemoIdentifiers) -> Self {
        Self {
            store,
            metrics,
            demo_ids,
        }
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub fn demo_ids(&self) -> &DemoIdentifiers {
        &self.demo_ids
    }

    #[instrument(
        skip(self, route, input),
        fields(route = %route, call_sid = input.call_sid.as_deref().unwrap_or("-"))
    )]
    pub fn handle_callback(&self, route: Route, input: CallbackInput) -> CallReply {
        let started = Instant::now();
        self.metrics.inc_callback();

        let stage = route.stage();
        let digits = input.digits.as_deref();
        if is_unrecognized(stage, digits) {
            self.metrics.inc_invalid_input();
        }

        let transition = advance(stage, digits);
        self.observe_prompt(&transition.prompt);
        self.metrics.observe_latency(started.elapsed());

        info!(
            stage = %stage,
            next = %transition.next,
            gather = transition.prompt.gather.is_some(),
            "callback handled"
        );

        CallReply {
            stage,
            next: transition.next,
            document: transition.prompt.render(),
        }
    }

    /// Text shortcut around the digit flow: classify, look up the configured
    /// demo record, speak the answer and hang up.
    #[instrument(skip(self, text))]
    pub async fn process_text(&self, text: Option<&str>) -> VoiceDocument {
        let started = Instant::now();
        self.metrics.inc_callback();

        let normalized = normalize_text(text.unwrap_or_default());
        let intent = classify_intent(&normalized);

        let reply = match intent {
            Intent::PnrQuery => self.pnr_status(&self.demo_ids.pnr).await,
            Intent::TrainQuery => self.train_timing(&self.demo_ids.train_number).await,
            Intent::Unknown => Ok(prompts::NOT_UNDERSTOOD.to_string()),
        };

        let sentence = match reply {
            Ok(sentence) => sentence,
            Err(err) => {
                error!(error = %err, intent = intent.as_str(), "record lookup failed");
                prompts::SERVICE_UNAVAILABLE.to_string()
            }
        };

        let prompt = spoken_reply(sentence);
        self.observe_prompt(&prompt);
        self.metrics.observe_latency(started.elapsed());
        info!(intent = intent.as_str(), "simulated text handled");

        prompt.render()
    }

    pub async fn pnr_status(&self, pnr: &str) -> Result<String> {
        let record = self.store.lookup(pnr).await?;
        let ticket = record.as_ref().and_then(|record| record.as_ticket());
        self.metrics.record_lookup(ticket.is_some());
        Ok(ticket_sentence(ticket))
    }

    pub async fn train_timing(&self, train_number: &str) -> Result<String> {
        let record = self.store.lookup(train_number).await?;
        let timing = record.as_ref().and_then(|record| record.as_train_timing());
        self.metrics.record_lookup(timing.is_some());
        Ok(train_timing_sentence(timing))
    }

    fn observe_prompt(&self, prompt: &VoicePrompt) {
        if prompt.gather.is_some() {
            self.metrics.inc_gather();
        }
        if prompt.terminal == Some(Terminal::Hangup) {
            self.metrics.inc_hangup();
        }
    }
}

fn is_unrecognized(stage: CallStage, digits: Option<&str>) -> bool {
    let digits = digits.unwrap_or_default();
    match stage {
        CallStage::LanguageSelect => Language::from_digit(digits).is_none(),
        CallStage::MainMenu => MenuOption::from_digit(digits).is_none(),
        _ => false,
    }
}
