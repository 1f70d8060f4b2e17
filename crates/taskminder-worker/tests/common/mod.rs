//! Shared fixtures for dispatcher tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use taskminder_core::config::{ClaimMode, DispatcherConfig};
use taskminder_database::{MemoryNotificationStore, MemoryProfileStore};
use taskminder_entity::notification::{Channel, JobStatus, NotificationJob};
use taskminder_entity::profile::ContactProfile;
use taskminder_messaging::{DeliveryError, MessagingGateway, TemplateMessage};
use taskminder_worker::{DeliveryAttemptHandler, DispatchLoop, JobClaimer};

/// Gateway that records every message and answers from a script.
/// Once the script runs out every send succeeds.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    sent: Arc<Mutex<Vec<TemplateMessage>>>,
    script: Arc<Mutex<VecDeque<Result<Value, DeliveryError>>>>,
    panics: Arc<Mutex<usize>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, result: Result<Value, DeliveryError>) {
        self.script.lock().await.push_back(result);
    }

    pub async fn reject_next(&self, count: usize) {
        for _ in 0..count {
            self.push(Err(DeliveryError::Rejected {
                status: 400,
                message: "(#131026) Message undeliverable".to_string(),
            }))
            .await;
        }
    }

    /// Make the next send panic instead of answering.
    pub async fn panic_next(&self) {
        *self.panics.lock().await += 1;
    }

    pub async fn sent(&self) -> Vec<TemplateMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MessagingGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send_template(&self, message: &TemplateMessage) -> Result<Value, DeliveryError> {
        {
            let mut panics = self.panics.lock().await;
            if *panics > 0 {
                *panics -= 1;
                drop(panics);
                panic!("gateway blew up");
            }
        }
        self.sent.lock().await.push(message.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"messages": [{"id": "wamid.TEST"}]})))
    }
}

/// A due job scheduled `minutes_ago` minutes in the past.
pub fn due_job(user_id: Uuid, minutes_ago: i64) -> NotificationJob {
    let now = Utc::now();
    NotificationJob {
        id: Uuid::new_v4(),
        user_id,
        task_id: Some(Uuid::new_v4()),
        channel: Channel::Whatsapp,
        scheduled_for: now - Duration::minutes(minutes_ago),
        next_retry_at: None,
        status: JobStatus::Scheduled,
        processing: false,
        attempts: 0,
        payload: json!({
            "mode": "template_by_task",
            "template_name": "rm_task_summary",
            "lang_code": "en",
            "tz_hint": "PDT",
            "header_hint": "15 min",
            "include_button": false,
            "task_snapshot": {
                "title": "Standup",
                "description": "Daily sync",
                "tag": "Work",
                "status": "pending",
                "start_ts": "2025-10-23T19:45:00-07:00",
                "end_ts": "2025-10-23T20:00:00-07:00"
            }
        }),
        created_at: now - Duration::minutes(minutes_ago + 30),
        updated_at: now,
    }
}

pub fn opted_in(user_id: Uuid) -> ContactProfile {
    ContactProfile {
        id: user_id,
        phone: Some("5215551234567".to_string()),
        notify_enabled: Some(true),
    }
}

pub fn opted_out(user_id: Uuid) -> ContactProfile {
    ContactProfile {
        notify_enabled: Some(false),
        ..opted_in(user_id)
    }
}

/// In-memory stores plus a scripted gateway wired into a dispatcher.
pub struct Harness {
    pub notifications: MemoryNotificationStore,
    pub profiles: MemoryProfileStore,
    pub gateway: ScriptedGateway,
    pub config: DispatcherConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            notifications: MemoryNotificationStore::new(),
            profiles: MemoryProfileStore::new(),
            gateway: ScriptedGateway::new(),
            config: DispatcherConfig {
                poll_interval_seconds: 1,
                batch_size: 20,
                max_attempts: 5,
                batch_pause_millis: 10,
                claim_mode: ClaimMode::Atomic,
                worker_id: Some("test-worker".to_string()),
            },
        }
    }

    pub fn handler(&self) -> DeliveryAttemptHandler {
        DeliveryAttemptHandler::new(
            Arc::new(self.notifications.clone()),
            Arc::new(self.profiles.clone()),
            Arc::new(self.gateway.clone()),
            self.config.max_attempts,
        )
    }

    pub fn claimer(&self) -> JobClaimer {
        JobClaimer::new(
            Arc::new(self.notifications.clone()),
            self.config.claim_mode,
            self.config.batch_size,
        )
    }

    pub fn dispatcher(&self) -> DispatchLoop {
        DispatchLoop::new(self.claimer(), self.handler(), &self.config)
    }

    /// Insert a due job for an opted-in user and return it.
    pub async fn seed_deliverable(&self, minutes_ago: i64) -> NotificationJob {
        let user_id = Uuid::new_v4();
        self.profiles.upsert(opted_in(user_id)).await;
        let job = due_job(user_id, minutes_ago);
        self.notifications.insert(job.clone()).await;
        job
    }

    /// Claim `job` the way the dispatch loop would, returning the claimed copy.
    pub async fn claim_one(&self, job: &NotificationJob) -> NotificationJob {
        self.claimer()
            .claim()
            .await
            .unwrap()
            .into_iter()
            .find(|j| j.id == job.id)
            .expect("job should be claimable")
    }
}
