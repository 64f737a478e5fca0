//! Per-batch processing: one strategy, one deadline, results in mention order.

use std::{sync::Arc, time::Duration};

use {
    futures::{StreamExt, stream},
    mentionbot_x::ReplyRequest,
    tokio::time::{Instant, timeout_at},
    tracing::{debug, info, warn},
};

use crate::{
    agent::AgentRunner,
    asker::Asker,
    error::{Error, Result},
    normalize::normalize,
    parse::flatten,
    sink::ReplySink,
    types::{BatchSummary, Mention, MentionBatch, ProcessingResult},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How each mention is answered. Chosen once when the pipeline is built.
#[derive(Clone)]
pub enum Strategy {
    /// Ask a tool for the answer, then post it.
    Direct {
        asker: Arc<dyn Asker>,
        sink: Arc<dyn ReplySink>,
    },
    /// Hand the question to an agent that answers and posts by itself.
    Delegated { runner: Arc<dyn AgentRunner> },
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Delegated { .. } => "delegated",
        }
    }
}

pub struct Pipeline {
    strategy: Strategy,
    timeout: Duration,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            timeout: DEFAULT_TIMEOUT,
            concurrency: 1,
        }
    }

    /// Deadline for a whole batch, measured from the start of [`run`](Self::run).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mentions in flight at once. Results keep input order regardless.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn mode(&self) -> &'static str {
        self.strategy.name()
    }

    /// Process every mention of every envelope. Never fails: per-mention
    /// errors end up in the summary.
    pub async fn run(&self, batches: Vec<MentionBatch>) -> BatchSummary {
        let (received, mentions) = flatten(batches);
        let deadline = Instant::now() + self.timeout;
        info!(
            received,
            mentions = mentions.len(),
            mode = self.mode(),
            concurrency = self.concurrency,
            "processing mentions"
        );

        let results: Vec<ProcessingResult> = stream::iter(mentions)
            .map(|mention| self.process_before(mention, deadline))
            .buffered(self.concurrency)
            .collect()
            .await;

        let posted = results.iter().filter(|r| r.posted).count();
        info!(
            processed = results.len(),
            posted,
            failed = results.len() - posted,
            "batch done"
        );
        BatchSummary {
            received,
            processed: results.len(),
            results,
        }
    }

    async fn process_before(&self, mention: Mention, deadline: Instant) -> ProcessingResult {
        if Instant::now() >= deadline {
            warn!(tweet_id = %mention.tweet_id, "deadline passed before mention started");
            return ProcessingResult::failed(mention.tweet_id, Error::DeadlineBeforeStart);
        }
        match timeout_at(deadline, self.process(&mention)).await {
            Ok(Ok(())) => ProcessingResult::posted(mention.tweet_id),
            Ok(Err(e)) => {
                warn!(tweet_id = %mention.tweet_id, error = %e, "mention failed");
                ProcessingResult::failed(mention.tweet_id, e)
            },
            Err(_) => {
                warn!(tweet_id = %mention.tweet_id, "deadline exceeded while processing mention");
                ProcessingResult::failed(mention.tweet_id, Error::DeadlineExceeded)
            },
        }
    }

    /// Answer one mention with the configured strategy.
    pub async fn process(&self, mention: &Mention) -> Result<()> {
        let question = normalize(&mention.text);
        debug!(tweet_id = %mention.tweet_id, %question, "normalized mention");

        match &self.strategy {
            Strategy::Direct { asker, sink } => {
                let answer = asker.ask(&question).await?;
                sink.post_reply(&ReplyRequest::new(&mention.tweet_id, answer))
                    .await
            },
            Strategy::Delegated { runner } => {
                runner.run(&question, &mention.tweet_id).await?;
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use {super::*, async_trait::async_trait};

    #[derive(Default)]
    struct ScriptedAsker {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Asker for ScriptedAsker {
        async fn ask(&self, question: &str) -> Result<String> {
            self.seen.lock().unwrap().push(question.to_string());
            match question {
                "fail" => Err(Error::ask("timeout")),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("late".into())
                },
                q if q.starts_with("wait ") => {
                    let ms: u64 = q[5..].parse().unwrap();
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(format!("answer to {q}"))
                },
                q => Ok(format!("answer to {q}")),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        posted: Mutex<Vec<ReplyRequest>>,
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn post_reply(&self, reply: &ReplyRequest) -> Result<()> {
            self.posted.lock().unwrap().push(reply.clone());
            Ok(())
        }
    }

    struct FlakyRunner;

    #[async_trait]
    impl AgentRunner for FlakyRunner {
        async fn run(&self, question: &str, reply_to: &str) -> Result<String> {
            if reply_to == "2" {
                return Err(Error::agent(format!("agent error: exit status: 1; stderr: {question}")));
            }
            Ok("ignored output".into())
        }
    }

    fn mention(id: &str, text: &str) -> Mention {
        Mention {
            tweet_id: id.into(),
            text: text.into(),
            ..Mention::default()
        }
    }

    fn batch(mentions: Vec<Mention>) -> Vec<MentionBatch> {
        vec![MentionBatch {
            mentions,
            ..MentionBatch::default()
        }]
    }

    fn direct() -> (Pipeline, Arc<ScriptedAsker>, Arc<RecordingSink>) {
        let asker = Arc::new(ScriptedAsker::default());
        let sink = Arc::new(RecordingSink::default());
        let pipeline = Pipeline::new(Strategy::Direct {
            asker: asker.clone(),
            sink: sink.clone(),
        });
        (pipeline, asker, sink)
    }

    #[tokio::test]
    async fn direct_asks_normalized_text_and_posts_answer() {
        let (pipeline, asker, sink) = direct();
        let summary = pipeline
            .run(batch(vec![mention("1", "@bot price of btc? https://x")]))
            .await;

        assert_eq!(summary.results, vec![ProcessingResult::posted("1")]);
        assert_eq!(*asker.seen.lock().unwrap(), vec!["price of btc?"]);
        assert_eq!(*sink.posted.lock().unwrap(), vec![ReplyRequest::new(
            "1",
            "answer to price of btc?"
        )]);
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_siblings() {
        let (pipeline, _, sink) = direct();
        let summary = pipeline
            .run(batch(vec![
                mention("1", "a"),
                mention("2", "fail"),
                mention("3", "c"),
            ]))
            .await;

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.results, vec![
            ProcessingResult::posted("1"),
            ProcessingResult::failed("2", "timeout"),
            ProcessingResult::posted("3"),
        ]);
        assert_eq!(sink.posted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delegated_ignores_output_and_records_errors() {
        let pipeline = Pipeline::new(Strategy::Delegated {
            runner: Arc::new(FlakyRunner),
        });
        assert_eq!(pipeline.mode(), "delegated");
        let summary = pipeline
            .run(batch(vec![mention("1", "@bot hi"), mention("2", "@bot eth?")]))
            .await;
        assert_eq!(summary.results, vec![
            ProcessingResult::posted("1"),
            ProcessingResult::failed("2", "agent error: exit status: 1; stderr: eth?"),
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_records_interrupted_and_unstarted_mentions() {
        let (pipeline, asker, _) = direct();
        let pipeline = pipeline.with_timeout(Duration::from_secs(5));
        let summary = pipeline
            .run(batch(vec![
                mention("1", "fast"),
                mention("2", "slow"),
                mention("3", "never"),
            ]))
            .await;

        assert_eq!(summary.results, vec![
            ProcessingResult::posted("1"),
            ProcessingResult::failed("2", "deadline exceeded"),
            ProcessingResult::failed("3", "deadline exceeded before processing started"),
        ]);
        assert_eq!(*asker.seen.lock().unwrap(), vec!["fast", "slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_results_keep_mention_order() {
        let (pipeline, _, sink) = direct();
        let pipeline = pipeline.with_concurrency(3);
        let summary = pipeline
            .run(batch(vec![
                mention("1", "wait 300"),
                mention("2", "wait 100"),
                mention("3", "wait 200"),
            ]))
            .await;

        let ids: Vec<&str> = summary.results.iter().map(|r| r.tweet_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(summary.results.iter().all(|r| r.posted));

        // Completion order differs from input order.
        let posted: Vec<String> = sink
            .posted
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.in_reply_to.clone())
            .collect();
        assert_eq!(posted, vec!["2", "3", "1"]);
    }

    #[tokio::test]
    async fn empty_batch() {
        let (pipeline, ..) = direct();
        let summary = pipeline.run(Vec::new()).await;
        assert_eq!(summary, BatchSummary {
            received: 0,
            processed: 0,
            results: vec![],
        });
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let (pipeline, ..) = direct();
        assert_eq!(pipeline.with_concurrency(0).concurrency, 1);
    }
}
