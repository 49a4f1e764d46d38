use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use modelkit_data::query::WhereInput;
use modelkit_data::{
    CreateArgs, Data, DataError, FindManyArgs, ModelAccessor, StorageError, UniqueArgs, Value,
    WriteArgs,
};

use crate::eval::{compare_records, matches};

/// A row: column name to value.
pub type Record = BTreeMap<String, Value>;

/// Accessor operations, as recorded by [`MemoryModel::calls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Count,
    FindMany,
    FindFirst,
    FindUnique,
    Create,
    Update,
    UpdateMany,
    Delete,
}

#[derive(Default)]
struct State {
    rows: Vec<Record>,
    next_id: i64,
    unique: Vec<Vec<String>>,
    failures: HashMap<Op, VecDeque<DataError>>,
    calls: Vec<Op>,
    find_many_args: Vec<FindManyArgs>,
}

/// In-memory [`ModelAccessor`] over [`Record`] rows.
///
/// Every operation yields to the scheduler once before touching state, like
/// a storage round-trip would, so `tokio::join!` interleaves two calls
/// deterministically. Clones share the same table.
///
/// ```ignore
/// let posts = MemoryModel::new("post").unique(&["slug"]);
/// posts.insert(Data::new().set("slug", "a").set("title", "A"));
/// posts.fail_next(Op::Count, DataError::database(io_error));
/// ```
#[derive(Clone)]
pub struct MemoryModel {
    name: String,
    state: Arc<Mutex<State>>,
}

impl MemoryModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(State {
                next_id: 1,
                ..State::default()
            })),
        }
    }

    /// Declare a unique constraint over `columns`.
    pub fn unique(self, columns: &[&str]) -> Self {
        self.state()
            .unique
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Insert a row directly, bypassing constraints and call recording.
    pub fn insert(&self, data: Data) -> Record {
        let mut state = self.state();
        let record = state.new_record(&data);
        state.rows.push(record.clone());
        record
    }

    /// Snapshot of every row, in insertion order.
    pub fn rows(&self) -> Vec<Record> {
        self.state().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.state().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next call of `op` fail with `err`. Queued failures are consumed
    /// in order.
    pub fn fail_next(&self, op: Op, err: DataError) {
        self.state().failures.entry(op).or_default().push_back(err);
    }

    /// Every operation issued so far, in order.
    pub fn calls(&self) -> Vec<Op> {
        self.state().calls.clone()
    }

    /// Arguments of the most recent `find_many` call.
    pub fn last_find_many(&self) -> Option<FindManyArgs> {
        self.state().find_many_args.last().cloned()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Yield, then run `f` against the table unless a failure is queued.
    async fn round_trip<R>(
        &self,
        op: Op,
        f: impl FnOnce(&mut State) -> Result<R, DataError>,
    ) -> Result<R, DataError> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.calls.push(op);
        if let Some(err) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        f(&mut state)
    }
}

impl State {
    fn new_record(&mut self, data: &Data) -> Record {
        let mut record: Record = data
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        match record.get("id").and_then(Value::as_i64) {
            Some(id) => self.next_id = self.next_id.max(id + 1),
            None => {
                record.insert("id".to_string(), Value::Int(self.next_id));
                self.next_id += 1;
            }
        }
        record
    }

    fn select(&self, args: &FindManyArgs) -> Vec<Record> {
        let mut rows: Vec<Record> = self
            .rows
            .iter()
            .filter(|r| args.filter.as_ref().map_or(true, |f| matches(r, f)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_records(a, b, &args.order_by));
        let skip = usize::try_from(args.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let take = args
            .take
            .map_or(usize::MAX, |t| usize::try_from(t).unwrap_or(usize::MAX));
        rows.into_iter()
            .skip(skip)
            .take(take)
            .map(|r| project(r, args.select.as_deref()))
            .collect()
    }

    fn position(&self, filter: &WhereInput) -> Option<usize> {
        self.rows.iter().position(|r| matches(r, filter))
    }

    /// Reject `candidate` if it collides with any row other than `skip`.
    fn check_unique(&self, candidate: &Record, skip: Option<usize>) -> Result<(), DataError> {
        for columns in &self.unique {
            let key: Vec<&Value> = columns
                .iter()
                .map(|c| candidate.get(c).unwrap_or(&Value::Null))
                .collect();
            if key.iter().any(|v| v.is_null()) {
                continue;
            }
            let clash = self.rows.iter().enumerate().any(|(i, row)| {
                Some(i) != skip
                    && columns
                        .iter()
                        .zip(&key)
                        .all(|(c, v)| row.get(c) == Some(*v))
            });
            if clash {
                return Err(StorageError::unique_violation(
                    columns.clone(),
                    format!("Unique constraint failed on the fields: ({})", columns.join(", ")),
                )
                .into());
            }
        }
        Ok(())
    }
}

fn project(record: Record, select: Option<&[String]>) -> Record {
    match select {
        None => record,
        Some(columns) => record
            .into_iter()
            .filter(|(k, _)| columns.iter().any(|c| c == k))
            .collect(),
    }
}

fn apply(record: &mut Record, data: &Data) {
    for (column, value) in data.iter() {
        record.insert(column.to_string(), value.clone());
    }
}

impl ModelAccessor for MemoryModel {
    type Row = Record;

    fn model_name(&self) -> &str {
        &self.name
    }

    fn count(
        &self,
        filter: Option<&WhereInput>,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        self.round_trip(Op::Count, move |state| {
            Ok(state
                .rows
                .iter()
                .filter(|r| filter.map_or(true, |f| matches(r, f)))
                .count() as u64)
        })
    }

    fn find_many(
        &self,
        args: &FindManyArgs,
    ) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send {
        self.round_trip(Op::FindMany, move |state| {
            state.find_many_args.push(args.clone());
            Ok(state.select(args))
        })
    }

    fn find_first(
        &self,
        args: &FindManyArgs,
    ) -> impl Future<Output = Result<Option<Record>, DataError>> + Send {
        self.round_trip(Op::FindFirst, move |state| {
            let mut args = args.clone();
            args.take = Some(1);
            Ok(state.select(&args).into_iter().next())
        })
    }

    fn find_unique(
        &self,
        args: &UniqueArgs,
    ) -> impl Future<Output = Result<Option<Record>, DataError>> + Send {
        self.round_trip(Op::FindUnique, move |state| {
            Ok(state
                .position(&args.filter)
                .map(|i| project(state.rows[i].clone(), args.select.as_deref())))
        })
    }

    fn create(&self, args: &CreateArgs) -> impl Future<Output = Result<Record, DataError>> + Send {
        self.round_trip(Op::Create, move |state| {
            let record = state.new_record(&args.data);
            state.check_unique(&record, None)?;
            state.rows.push(record.clone());
            Ok(project(record, args.select.as_deref()))
        })
    }

    fn update(&self, args: &WriteArgs) -> impl Future<Output = Result<Record, DataError>> + Send {
        self.round_trip(Op::Update, move |state| {
            let Some(index) = state.position(&args.filter) else {
                return Err(StorageError::record_not_found("Record to update not found.").into());
            };
            let mut updated = state.rows[index].clone();
            apply(&mut updated, &args.data);
            state.check_unique(&updated, Some(index))?;
            state.rows[index] = updated.clone();
            Ok(updated)
        })
    }

    fn update_many(&self, args: &WriteArgs) -> impl Future<Output = Result<u64, DataError>> + Send {
        self.round_trip(Op::UpdateMany, move |state| {
            let mut changed = 0;
            for row in state.rows.iter_mut().filter(|r| matches(r, &args.filter)) {
                apply(row, &args.data);
                changed += 1;
            }
            Ok(changed)
        })
    }

    fn delete(&self, args: &UniqueArgs) -> impl Future<Output = Result<Record, DataError>> + Send {
        self.round_trip(Op::Delete, move |state| {
            let Some(index) = state.position(&args.filter) else {
                return Err(StorageError::record_not_found("Record to delete does not exist.").into());
            };
            let removed = state.rows.remove(index);
            Ok(project(removed, args.select.as_deref()))
        })
    }
}
