// One user's session over the shared player table.
//
// The table is an immutable snapshot behind an `Arc`; every call takes a
// `FilterRequest` and recomputes the view from scratch. The conversation
// history belongs to the session, never to the pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use tracing::{debug, info, warn};

use rosterscope_baseball::export::export_to_path;
use rosterscope_baseball::filter::FilterRequest;
use rosterscope_baseball::leaderboard::{
    top_categories_plus_other, top_n, GroupKey, LegendEntry, Qualifier, SortOrder,
};
use rosterscope_baseball::record::PlayerSeason;
use rosterscope_baseball::stats::StatId;
use rosterscope_baseball::summary::{build_question_prompt, ViewSummary};
use rosterscope_baseball::table::{PlayerTable, TableCache};
use rosterscope_core::config::Config;
use rosterscope_llm::client::{collect_reply, Assistant, LlmClient};

use crate::conversation::{Conversation, Exchange};

pub struct Session {
    config: Config,
    table: Arc<PlayerTable>,
    assistant: Box<dyn Assistant>,
    conversation: Conversation,
}

impl Session {
    pub fn new(config: Config, table: Arc<PlayerTable>, assistant: Box<dyn Assistant>) -> Self {
        let conversation = Conversation::new(config.assistant.history_limit);
        Self {
            config,
            table,
            assistant,
            conversation,
        }
    }

    /// Load (or reuse) the table for the configured data files and wire up
    /// the assistant from credentials.
    pub fn open(config: Config, cache: &mut TableCache) -> anyhow::Result<Self> {
        let pitchers = config.pitchers_path();
        let hitters = config.hitters_path();
        let table = cache
            .get_or_load(&pitchers, &hitters)
            .context("failed to load player data")?;

        let client = LlmClient::from_config(&config);
        if !client.is_enabled() {
            info!("no xai_api_key configured; assistant disabled");
        }
        info!(rows = table.len(), "session opened");
        Ok(Self::new(config, table, Box::new(client)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &Arc<PlayerTable> {
        &self.table
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn clear_history(&mut self) {
        self.conversation.clear();
        debug!("conversation history cleared");
    }

    /// Validate `request` against the draft-round limit from `[filters]` and
    /// apply it to the table.
    pub fn filter(&self, request: &FilterRequest) -> anyhow::Result<Vec<&PlayerSeason>> {
        request.validate().context("invalid filter request")?;
        request
            .check_draft_round_limit(self.config.filters.draft_round_max)
            .context("invalid filter request")?;
        let view = request.apply(&self.table);
        debug!(
            criteria = request.active_criteria().len(),
            rows = view.len(),
            "filter applied"
        );
        Ok(view)
    }

    /// Top rows of the filtered view by `stat`. Rate stats only rank rows
    /// with enough volume: plate appearances for hitting rates, innings for
    /// pitching rates, thresholds from `[leaderboard]`.
    pub fn leaders(
        &self,
        request: &FilterRequest,
        stat: StatId,
        n: Option<usize>,
        order: Option<SortOrder>,
    ) -> anyhow::Result<Vec<&PlayerSeason>> {
        let view = self.filter(request)?;
        let n = n.unwrap_or(self.config.leaderboard.top_n);
        let order = order.unwrap_or_else(|| natural_order(stat));
        Ok(top_n(&view, stat, n, order, self.qualifier_for(stat)))
    }

    /// Legend entries for the filtered view, small inner groups folded into
    /// "Other".
    pub fn legend(
        &self,
        request: &FilterRequest,
        outer: GroupKey,
        inner: GroupKey,
        keep_top_k: Option<usize>,
    ) -> anyhow::Result<Vec<LegendEntry>> {
        let view = self.filter(request)?;
        let k = keep_top_k.unwrap_or(self.config.leaderboard.legend_top_k);
        Ok(top_categories_plus_other(&view, outer, inner, k))
    }

    /// Write the filtered view to `path` as CSV. Returns the row count.
    pub fn export(&self, request: &FilterRequest, path: &Path) -> anyhow::Result<usize> {
        let view = self.filter(request)?;
        let written = export_to_path(&view, path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        info!(rows = written, path = %path.display(), "exported view");
        Ok(written)
    }

    /// Ask the assistant about the current filtered view.
    ///
    /// Only an invalid request or an empty question is an `Err`. Assistant
    /// failures come back as an exchange with `failed` set and the error text
    /// as the answer. Tokens are handed to `on_token` as they stream in.
    pub async fn ask<F>(
        &mut self,
        question: &str,
        request: &FilterRequest,
        on_token: F,
    ) -> anyhow::Result<Exchange>
    where
        F: FnMut(&str) + Send,
    {
        let question = question.trim();
        if question.is_empty() {
            bail!("question is empty");
        }

        let prompt = {
            let view = self.filter(request)?;
            let summary = ViewSummary::of(&view, self.config.assistant.sample_rows);
            build_question_prompt(&summary, question)
        };

        let reply = collect_reply(self.assistant.as_ref(), &prompt, on_token).await;
        if reply.failed {
            warn!(error = %reply.text, "assistant call failed");
        }

        let exchange = Exchange {
            question: question.to_string(),
            answer: reply.text,
            failed: reply.failed,
            asked_at: Utc::now(),
        };
        self.conversation.push(exchange.clone());
        Ok(exchange)
    }

    fn qualifier_for(&self, stat: StatId) -> Option<Qualifier> {
        let lb = &self.config.leaderboard;
        match stat {
            StatId::Era | StatId::Whip => Some(Qualifier {
                stat: StatId::InningsPitched,
                min: lb.min_ip,
            }),
            StatId::Obp | StatId::Slg | StatId::Ops | StatId::T90PerPa => Some(Qualifier {
                stat: StatId::PlateAppearances,
                min: lb.min_pa,
            }),
            _ => None,
        }
    }
}

/// Direction in which a statistic is "better": lower for run prevention,
/// losses and caught stealing, higher for everything else.
pub fn natural_order(stat: StatId) -> SortOrder {
    match stat {
        StatId::Era | StatId::Whip | StatId::Losses | StatId::CaughtStealing => {
            SortOrder::Ascending
        }
        _ => SortOrder::Descending,
    }
}
