//! Transaction stream simulation.
//!
//! Generates a synthetic stream of client transactions through a phased
//! scenario (baseline learning, normal activity, an amount spike burst, a
//! velocity burst, a mule-network fan-in, and a dormancy reactivation) and
//! feeds every transaction through [`riskguard_engine::Engine`] end to end,
//! printing a progress log and a final summary of verdict counts.
//!
//! ```bash
//! ./simulate --clients 20 --minutes 30
//! ```

use std::sync::Arc;

use clap::Parser;
use rand::prelude::*;
use riskguard_engine::config::{self, EngineConfig};
use riskguard_engine::engine::{Engine, EvaluationRequest};
use riskguard_engine::graph::BeneficiaryGraph;
use riskguard_engine::notification::{LoggingNotificationSink, NotificationDispatcher};
use riskguard_engine::queue::ReviewQueue;
use riskguard_engine::rules::RuleRegistry;
use riskguard_engine::store::MemoryStore;
use riskguard_engine::types::{Action, AnomalyRule, RuleType, Transaction};
use riskguard_engine::Scheduler;

#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Synthetic transaction stream for riskguard-engine")]
#[command(version = "1.0")]
struct Args {
    /// Number of distinct clients in the stream.
    #[arg(short, long, default_value = "20")]
    clients: u32,

    /// Simulated minutes of activity.
    #[arg(short, long, default_value = "30")]
    minutes: u32,

    /// Average transactions per client per minute during normal activity.
    #[arg(long, default_value = "2")]
    rate_per_minute: u32,

    /// Random seed for reproducibility.
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the mission log (summary only).
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    BaselineLearning,
    NormalActivity,
    AmountSpike,
    VelocityBurst,
    MuleNetworkFanIn,
    DormancyReactivation,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::BaselineLearning => "Baseline Learning (profile warmup)",
            Phase::NormalActivity => "Normal Activity",
            Phase::AmountSpike => "Amount Spike (unusually large transfers)",
            Phase::VelocityBurst => "Velocity Burst (rapid-fire transactions)",
            Phase::MuleNetworkFanIn => "Mule Network Fan-In (shared beneficiary)",
            Phase::DormancyReactivation => "Dormancy Reactivation (long-idle client resumes)",
        }
    }

    fn from_progress(progress: f64) -> Self {
        match progress {
            p if p < 0.35 => Phase::BaselineLearning,
            p if p < 0.55 => Phase::NormalActivity,
            p if p < 0.70 => Phase::AmountSpike,
            p if p < 0.82 => Phase::VelocityBurst,
            p if p < 0.93 => Phase::MuleNetworkFanIn,
            _ => Phase::DormancyReactivation,
        }
    }
}

fn log_mission(minute: u32, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{:04}m] {}", minute, message);
    }
}

fn seed_default_rules() -> Vec<AnomalyRule> {
    RuleType::all()
        .into_iter()
        .map(|rule_type| AnomalyRule::new(format!("default-{}", rule_type.as_str().to_lowercase()), rule_type.as_str(), rule_type))
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    config::init_with(EngineConfig::default()).ok();

    let store = Arc::new(MemoryStore::new());
    let rules = Arc::new(RuleRegistry::new(store.clone()));
    for rule in seed_default_rules() {
        rules.save(&rule).await?;
    }

    let graph = Arc::new(BeneficiaryGraph::new(store.clone()));
    let queue = Arc::new(ReviewQueue::new(store.clone()));
    let notifier = NotificationDispatcher::spawn(Arc::new(LoggingNotificationSink), 256);
    let engine = Engine::new(store.clone(), rules.clone(), graph.clone(), queue.clone(), notifier.clone());
    let scheduler = Scheduler::spawn(store.clone(), rules.clone(), graph.clone(), queue.clone(), notifier);

    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let client_ids: Vec<String> = (0..args.clients).map(|i| format!("CLIENT-{i:04}")).collect();
    let shared_beneficiary = "HDFC0009999:9990011122".to_string();
    let dormant_client = client_ids[0].clone();

    let total_minutes = args.minutes;
    let mut pass = 0u64;
    let mut alert = 0u64;
    let mut block = 0u64;
    let mut txn_seq = 0u64;
    let start_ts: i64 = 1_700_000_000_000;

    log_mission(0, &"=".repeat(70), args.quiet);
    log_mission(0, "TRANSACTION RISK ENGINE SIMULATION", args.quiet);
    log_mission(0, &format!("{} clients, {} minutes", args.clients, args.minutes), args.quiet);
    log_mission(0, &"=".repeat(70), args.quiet);

    let mut current_phase = Phase::BaselineLearning;

    for minute in 0..total_minutes {
        let progress = minute as f64 / total_minutes as f64;
        let phase = Phase::from_progress(progress);
        if phase != current_phase {
            current_phase = phase;
            log_mission(minute, "", args.quiet);
            log_mission(minute, &format!(">>> PHASE: {}", phase.name()), args.quiet);
        }

        for client_id in &client_ids {
            if *client_id == dormant_client && phase != Phase::DormancyReactivation {
                // This client goes silent after baseline learning, to be
                // reactivated in the final phase.
                if phase != Phase::BaselineLearning {
                    continue;
                }
            }

            let txns_this_minute = match phase {
                Phase::VelocityBurst => args.rate_per_minute * 8,
                _ => args.rate_per_minute,
            };

            for _ in 0..txns_this_minute {
                txn_seq += 1;
                let ts = start_ts + (minute as i64 * 60_000) + rng.gen_range(0..60_000);
                let amount = match phase {
                    Phase::AmountSpike => rng.gen_range(50_000.0..200_000.0),
                    Phase::DormancyReactivation if *client_id == dormant_client => rng.gen_range(20_000.0..60_000.0),
                    _ => rng.gen_range(100.0..2_000.0),
                };
                let (bene_ifsc, bene_account) = if phase == Phase::MuleNetworkFanIn && rng.gen_bool(0.6) {
                    let parts: Vec<&str> = shared_beneficiary.splitn(2, ':').collect();
                    (Some(parts[0].to_string()), Some(parts[1].to_string()))
                } else {
                    (Some("HDFC0001111".to_string()), Some(format!("ACC{}", rng.gen_range(1000..9999))))
                };

                let txn = Transaction {
                    txn_id: format!("TXN-{txn_seq:08}"),
                    client_id: client_id.clone(),
                    txn_type: if rng.gen_bool(0.7) { "NEFT".into() } else { "UPI".into() },
                    amount,
                    timestamp: ts,
                    beneficiary_ifsc: bene_ifsc,
                    beneficiary_account: bene_account,
                };

                match engine.evaluate(EvaluationRequest::new(txn)).await {
                    Ok(result) => match result.action {
                        Action::Pass => pass += 1,
                        Action::Alert => alert += 1,
                        Action::Block => block += 1,
                    },
                    Err(e) => {
                        log_mission(minute, &format!("evaluation error for {client_id}: {e}"), args.quiet);
                    }
                }
            }
        }

        if minute % 5 == 0 {
            log_mission(
                minute,
                &format!("progress {:.0}% | pass={pass} alert={alert} block={block}", progress * 100.0),
                args.quiet,
            );
        }
    }

    scheduler.shutdown().await;

    log_mission(total_minutes, &"=".repeat(70), args.quiet);
    log_mission(total_minutes, "SIMULATION COMPLETE", args.quiet);
    log_mission(total_minutes, &format!("total transactions: {}", pass + alert + block), args.quiet);
    log_mission(total_minutes, &format!("pass={pass} alert={alert} block={block}"), args.quiet);
    let counts = queue.count_by_status().await?;
    log_mission(total_minutes, &format!("review queue status counts: {counts:?}"), args.quiet);
    log_mission(total_minutes, &"=".repeat(70), args.quiet);

    Ok(())
}
