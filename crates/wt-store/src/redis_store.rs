//! Redis-backed store.
//!
//! Records are JSON strings under namespaced keys. Insertion order is kept
//! in list indexes. Claims run as a Lua script over the queued-task list;
//! other status changes use a compare-and-set on the raw record.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::{AsyncCommands, Script};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use wt_models::{Job, JobId, TaskId, TaskStatus, TranscodingTask, WorkerEvent, WorkerRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::{StateStore, TaskFilter, WORKER_HISTORY_LIMIT};

/// Attempts before a contended compare-and-set gives up.
const MAX_CAS_ATTEMPTS: usize = 16;

const CLAIM_SCRIPT: &str = r#"
while true do
    local id = redis.call('LPOP', KEYS[1])
    if not id then
        return false
    end
    local key = ARGV[3] .. id
    local raw = redis.call('GET', key)
    if raw then
        local task = cjson.decode(raw)
        if task['status'] == 'queued' then
            task['status'] = 'running'
            task['claimed_by'] = ARGV[1]
            task['started_at'] = ARGV[2]
            local encoded = cjson.encode(task)
            redis.call('SET', key, encoded)
            return encoded
        end
    end
end
"#;

const CAS_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2])
    return 1
else
    return 0
end
"#;

/// Store backed by a Redis server.
pub struct RedisStore {
    client: redis::Client,
    namespace: String,
}

impl RedisStore {
    pub fn new(redis_url: &str, namespace: impl Into<String>) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            namespace: namespace.into(),
        })
    }

    async fn conn(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::unavailable(format!("Redis connection failed: {}", e)))
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.namespace, suffix)
    }

    fn job_key(&self, id: &str) -> String {
        self.key(&format!("job:{}", id))
    }

    fn task_prefix(&self) -> String {
        self.key("task:")
    }

    fn task_key(&self, id: &str) -> String {
        format!("{}{}", self.task_prefix(), id)
    }

    fn job_tasks_key(&self, job_id: &str) -> String {
        self.key(&format!("job_tasks:{}", job_id))
    }

    fn worker_key(&self, addr: &str) -> String {
        self.key(&format!("worker:{}", addr))
    }

    fn worker_events_key(&self, addr: &str) -> String {
        self.key(&format!("worker_events:{}", addr))
    }

    async fn load_many<T: DeserializeOwned>(&self, keys: Vec<String>) -> StoreResult<Vec<T>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn().await?;
        let raws: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;
        let mut out = Vec::with_capacity(raws.len());
        for raw in raws.into_iter().flatten() {
            out.push(serde_json::from_str(&raw)?);
        }
        Ok(out)
    }

    async fn insert_new(&self, kind: &'static str, key: &str, id: &str, payload: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let set: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        if set.is_none() {
            return Err(StoreError::already_exists(kind, id));
        }
        Ok(())
    }

    async fn set_existing(&self, kind: &'static str, key: &str, id: &str, payload: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let set: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        if set.is_none() {
            return Err(StoreError::not_found(kind, id));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        let payload = serde_json::to_string(job)?;
        self.insert_new("job", &self.job_key(job.id.as_str()), job.id.as_str(), &payload)
            .await?;
        let mut conn = self.conn().await?;
        conn.rpush::<_, _, ()>(self.key("jobs"), job.id.as_str()).await?;
        debug!(job_id = %job.id, "Inserted job");
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Job> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(self.job_key(id.as_str())).await?;
        let raw = raw.ok_or_else(|| StoreError::not_found("job", id.as_str()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn upsert_job(&self, job: &Job) -> StoreResult<()> {
        let payload = serde_json::to_string(job)?;
        match self
            .set_existing("job", &self.job_key(job.id.as_str()), job.id.as_str(), &payload)
            .await
        {
            Err(e) if e.is_not_found() => self.insert_job(job).await,
            other => other,
        }
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let mut conn = self.conn().await?;
        let ids: Vec<String> = conn.lrange(self.key("jobs"), 0, -1).await?;
        let keys = ids.iter().map(|id| self.job_key(id)).collect();
        self.load_many(keys).await
    }

    async fn insert_task(&self, task: &TranscodingTask) -> StoreResult<()> {
        let payload = serde_json::to_string(task)?;
        self.insert_new("task", &self.task_key(task.id.as_str()), task.id.as_str(), &payload)
            .await?;

        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.rpush(self.key("tasks"), task.id.as_str())
            .ignore()
            .rpush(self.job_tasks_key(task.job_id.as_str()), task.id.as_str())
            .ignore();
        if task.status == TaskStatus::Queued {
            pipe.rpush(self.key("queued"), task.id.as_str()).ignore();
        }
        pipe.query_async::<()>(&mut conn).await?;
        debug!(task_id = %task.id, job_id = %task.job_id, "Inserted task");
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<TranscodingTask> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(self.task_key(id.as_str())).await?;
        let raw = raw.ok_or_else(|| StoreError::not_found("task", id.as_str()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn upsert_task(&self, task: &TranscodingTask) -> StoreResult<()> {
        let payload = serde_json::to_string(task)?;
        match self
            .set_existing("task", &self.task_key(task.id.as_str()), task.id.as_str(), &payload)
            .await
        {
            Err(e) if e.is_not_found() => self.insert_task(task).await,
            other => other,
        }
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<TranscodingTask>> {
        let index = match &filter.job_id {
            Some(job_id) => self.job_tasks_key(job_id.as_str()),
            None => self.key("tasks"),
        };
        let mut conn = self.conn().await?;
        let ids: Vec<String> = conn.lrange(index, 0, -1).await?;
        let keys = ids.iter().map(|id| self.task_key(id)).collect();
        let tasks: Vec<TranscodingTask> = self.load_many(keys).await?;
        Ok(tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    async fn count_tasks(&self, status: TaskStatus) -> StoreResult<u64> {
        let tasks = self.find_tasks(&TaskFilter::with_status(status)).await?;
        Ok(tasks.len() as u64)
    }

    async fn claim_next_queued(
        &self,
        worker: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingTask>> {
        let mut conn = self.conn().await?;
        let claimed: Option<String> = Script::new(CLAIM_SCRIPT)
            .key(self.key("queued"))
            .arg(worker)
            .arg(now.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .arg(self.task_prefix())
            .invoke_async(&mut conn)
            .await?;

        match claimed {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn transition_task(
        &self,
        id: &TaskId,
        allowed_from: &[TaskStatus],
        to: TaskStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingTask>> {
        let key = self.task_key(id.as_str());
        let script = Script::new(CAS_SCRIPT);
        let mut conn = self.conn().await?;

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let raw: Option<String> = conn.get(&key).await?;
            let raw = raw.ok_or_else(|| StoreError::not_found("task", id.as_str()))?;
            let prior: TranscodingTask = serde_json::from_str(&raw)?;
            if !allowed_from.contains(&prior.status) {
                return Ok(None);
            }

            let mut next = prior.clone();
            next.apply_status(to, now);
            let payload = serde_json::to_string(&next)?;

            let swapped: i32 = script
                .key(&key)
                .arg(&raw)
                .arg(&payload)
                .invoke_async(&mut conn)
                .await?;
            if swapped == 1 {
                if to == TaskStatus::Queued {
                    conn.rpush::<_, _, ()>(self.key("queued"), id.as_str()).await?;
                }
                return Ok(Some(prior));
            }
            debug!(task_id = %id, attempt, "Task changed concurrently, retrying transition");
        }

        warn!(task_id = %id, "Gave up on contended task transition");
        Err(StoreError::unavailable(format!(
            "task {} is contended, transition not applied",
            id
        )))
    }

    async fn record_worker_event(&self, event: &WorkerEvent) -> StoreResult<()> {
        let record = serde_json::to_string(&event.to_record())?;
        let entry = serde_json::to_string(event)?;
        let events_key = self.worker_events_key(&event.addr);
        let mut conn = self.conn().await?;
        redis::pipe()
            .set(self.worker_key(&event.addr), record)
            .ignore()
            .sadd(self.key("workers"), &event.addr)
            .ignore()
            .rpush(&events_key, entry)
            .ignore()
            .ltrim(&events_key, -(WORKER_HISTORY_LIMIT as isize), -1)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_workers(&self) -> StoreResult<Vec<WorkerRecord>> {
        let mut conn = self.conn().await?;
        let mut addrs: Vec<String> = conn.smembers(self.key("workers")).await?;
        addrs.sort();
        let keys = addrs.iter().map(|addr| self.worker_key(addr)).collect();
        self.load_many(keys).await
    }

    async fn worker_events(&self, addr: &str) -> StoreResult<Vec<WorkerEvent>> {
        let mut conn = self.conn().await?;
        let raws: Vec<String> = conn.lrange(self.worker_events_key(addr), 0, -1).await?;
        raws.iter()
            .map(|raw| serde_json::from_str(raw).map_err(StoreError::from))
            .collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
