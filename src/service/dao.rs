//! Data-access runtime: paged reads, chunked bulk writes with row correlation, and save.

use crate::bean::{DataObject, DynamicBean};
use crate::client::CrmClient;
use crate::config::{FieldCatalog, FieldDescriptor, ModuleDescriptor};
use crate::error::{BatchFailure, ConfigError, CrmError, FailedItem, FailureCause};
use crate::response::{BatchItemResult, Response};
use crate::service::mapper;
use crate::service::validation::RecordValidator;
use crate::wire::{self, ListOptions, Page, Record, Request, WriteOptions};
use chrono::{FixedOffset, NaiveDateTime};
use std::collections::BTreeMap;

/// Module-specific half of a data-access object. Generated for every module; see also
/// [`DynamicAccess`] for catalog-driven use without generated code.
pub trait DataAccess: Send + Sync {
    type Object: DataObject;

    /// Module key on the wire.
    fn module(&self) -> &str;
    fn singular_name(&self) -> &str;
    fn plural_name(&self) -> &str;
    /// Field catalog the object type was generated from.
    fn catalog(&self) -> Result<FieldCatalog, ConfigError>;
    /// A fresh, clean object with no id.
    fn create(&self, catalog: &FieldCatalog) -> Self::Object;
}

/// Access to any module through [`DynamicBean`]s.
#[derive(Clone, Debug)]
pub struct DynamicAccess {
    module: ModuleDescriptor,
    catalog: FieldCatalog,
}

impl DynamicAccess {
    pub fn new(module: ModuleDescriptor, catalog: FieldCatalog) -> Self {
        DynamicAccess { module, catalog }
    }

    /// Build from a live field catalog.
    pub async fn discover(client: &CrmClient, module: ModuleDescriptor) -> Result<Self, CrmError> {
        let catalog = client.get_field_catalog(&module.key).await?;
        if catalog.is_empty() {
            return Err(ConfigError::GenerationSkipped {
                module: module.key,
                reason: "no accessible fields".into(),
            }
            .into());
        }
        Ok(DynamicAccess { module, catalog })
    }
}

impl DataAccess for DynamicAccess {
    type Object = DynamicBean;

    fn module(&self) -> &str {
        &self.module.key
    }

    fn singular_name(&self) -> &str {
        &self.module.singular_label
    }

    fn plural_name(&self) -> &str {
        &self.module.plural_label
    }

    fn catalog(&self) -> Result<FieldCatalog, ConfigError> {
        Ok(self.catalog.clone())
    }

    fn create(&self, catalog: &FieldCatalog) -> DynamicBean {
        DynamicBean::new(catalog)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriteKind {
    Insert,
    Update,
}

impl WriteKind {
    fn progressive(self) -> &'static str {
        match self {
            WriteKind::Insert => "inserting",
            WriteKind::Update => "updating",
        }
    }

    fn past(self) -> &'static str {
        match self {
            WriteKind::Insert => "inserted",
            WriteKind::Update => "updated",
        }
    }

    fn request(self, module: &str, records: &[Record], options: &WriteOptions) -> Request {
        match self {
            WriteKind::Insert => wire::insert_records(module, records, options),
            WriteKind::Update => wire::update_records(module, records, options),
        }
    }
}

#[derive(Default)]
struct Outcome {
    succeeded: usize,
    failures: Vec<FailedItem>,
}

impl Outcome {
    fn absorb(&mut self, other: Outcome) {
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
    }

    fn into_result(mut self, action: &'static str, module: &str) -> Result<(), CrmError> {
        if self.failures.is_empty() {
            return Ok(());
        }
        self.failures.sort_by_key(|f| f.index);
        Err(BatchFailure {
            action,
            module: module.to_string(),
            succeeded: self.succeeded,
            failures: self.failures,
        }
        .into())
    }
}

/// Runtime for one module: a shared client, the module's access half and its parsed catalog.
pub struct Dao<A: DataAccess> {
    client: CrmClient,
    access: A,
    catalog: FieldCatalog,
}

impl<A: DataAccess> Dao<A> {
    pub fn new(client: CrmClient, access: A) -> Result<Self, CrmError> {
        let catalog = access.catalog()?;
        Ok(Dao {
            client,
            access,
            catalog,
        })
    }

    pub fn module(&self) -> &str {
        self.access.module()
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Descriptor by generated field name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.catalog.field(name)
    }

    pub fn create(&self) -> A::Object {
        self.access.create(&self.catalog)
    }

    fn time_zone(&self) -> FixedOffset {
        self.client.settings().time_zone
    }

    fn decode(&self, records: Vec<Record>) -> Result<Vec<A::Object>, CrmError> {
        let tz = self.time_zone();
        records
            .iter()
            .map(|record| {
                let mut obj = self.create();
                mapper::from_record(&mut obj, record, &self.catalog, tz)?;
                Ok(obj)
            })
            .collect()
    }

    /// `None` when the record does not exist.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<A::Object>, CrmError> {
        let found = self.get_by_ids(&[id.to_string()]).await?;
        Ok(found.into_iter().next())
    }

    pub async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<A::Object>, CrmError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let request = wire::get_record_by_ids(self.module(), ids);
        let records = self
            .client
            .execute(&request)
            .await?
            .into_records(self.module(), request.operation)?;
        self.decode(records)
    }

    /// All records of the module, at most `limit` when given.
    pub async fn get_records(&self, options: &ListOptions, limit: Option<usize>) -> Result<Vec<A::Object>, CrmError> {
        let module = self.module();
        let records = self
            .fetch_pages(limit, |page| wire::get_records(module, options, Some(page)), records_of)
            .await?;
        self.decode(records)
    }

    pub async fn search_records(
        &self,
        criteria: Option<&str>,
        options: &ListOptions,
        limit: Option<usize>,
    ) -> Result<Vec<A::Object>, CrmError> {
        let module = self.module();
        let records = self
            .fetch_pages(
                limit,
                |page| wire::search_records(module, criteria, options, Some(page)),
                records_of,
            )
            .await?;
        self.decode(records)
    }

    /// Records of this module related to record `parent_id` of `parent_module`.
    pub async fn get_related_records(
        &self,
        parent_module: &str,
        parent_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<A::Object>, CrmError> {
        let module = self.module();
        let records = self
            .fetch_pages(
                limit,
                |page| wire::get_related_records(module, parent_id, parent_module, Some(page)),
                records_of,
            )
            .await?;
        self.decode(records)
    }

    pub async fn get_deleted_record_ids(
        &self,
        since: Option<NaiveDateTime>,
        limit: Option<usize>,
    ) -> Result<Vec<String>, CrmError> {
        let module = self.module();
        self.fetch_pages(
            limit,
            |page| wire::get_deleted_record_ids(module, since, Some(page)),
            |response, request| match response {
                Response::DeletedIds(ids) => Ok(ids),
                Response::NoContent { .. } => Ok(Vec::new()),
                _ => Err(unexpected(request)),
            },
        )
        .await
    }

    /// Pages of at most `page_size` rows until a short page or `limit`; the offset advances by
    /// the number of rows actually returned.
    async fn fetch_pages<T, B, X>(&self, limit: Option<usize>, build: B, extract: X) -> Result<Vec<T>, CrmError>
    where
        B: Fn(Page) -> Request,
        X: Fn(Response, &Request) -> Result<Vec<T>, CrmError>,
    {
        let page_size = self.client.settings().page_size.max(1);
        let mut items = Vec::new();
        loop {
            let want = match limit {
                Some(limit) => page_size.min(limit.saturating_sub(items.len())),
                None => page_size,
            };
            if want == 0 {
                break;
            }
            let request = build(Page::new(items.len(), want));
            let response = self.client.execute(&request).await?;
            let mut page = extract(response, &request)?;
            let returned = page.len();
            tracing::debug!(
                module = %self.module(),
                operation = %request.operation,
                offset = items.len(),
                requested = want,
                returned,
                "page"
            );
            page.truncate(want);
            items.append(&mut page);
            if returned < want {
                break;
            }
        }
        Ok(items)
    }

    /// Insert all objects, at most `batch_size` per remote call. Successful objects receive
    /// their new id and are left clean; failed rows are reported together at the end.
    pub async fn insert_records(&self, objects: &mut [A::Object], options: &WriteOptions) -> Result<(), CrmError> {
        for obj in objects.iter() {
            RecordValidator::validate_insert(obj, &self.catalog)?;
        }
        let items = objects.iter_mut().enumerate().collect();
        self.write(WriteKind::Insert, items, options)
            .await?
            .into_result(WriteKind::Insert.past(), self.module())
    }

    /// Update all objects. A row the remote rejects or answers with another id is reported in
    /// the aggregate failure; its siblings are still updated.
    pub async fn update_records(&self, objects: &mut [A::Object], options: &WriteOptions) -> Result<(), CrmError> {
        for obj in objects.iter() {
            require_id(obj)?;
            RecordValidator::validate_update(obj, &self.catalog)?;
        }
        let items = objects.iter_mut().enumerate().collect();
        self.write(WriteKind::Update, items, options)
            .await?
            .into_result(WriteKind::Update.past(), self.module())
    }

    /// Objects with an id are updated, the rest inserted: one chunk sequence per partition.
    pub async fn save(&self, objects: &mut [A::Object]) -> Result<(), CrmError> {
        for obj in objects.iter() {
            if obj.has_id() {
                RecordValidator::validate_update(obj, &self.catalog)?;
            } else {
                RecordValidator::validate_insert(obj, &self.catalog)?;
            }
        }
        let (updates, inserts): (Vec<_>, Vec<_>) = objects.iter_mut().enumerate().partition(|(_, obj)| obj.has_id());
        let options = WriteOptions::default();
        let mut outcome = self.write(WriteKind::Insert, inserts, &options).await?;
        outcome.absorb(self.write(WriteKind::Update, updates, &options).await?);
        outcome.into_result("saved", self.module())
    }

    pub async fn delete(&self, id: &str) -> Result<(), CrmError> {
        let request = wire::delete_records(self.module(), id);
        match self.client.execute(&request).await? {
            Response::Status { code, message } => {
                tracing::debug!(module = %self.module(), id = %id, code = %code, message = %message, "deleted");
                Ok(())
            }
            _ => Err(unexpected(&request)),
        }
    }

    async fn write(
        &self,
        kind: WriteKind,
        mut items: Vec<(usize, &mut A::Object)>,
        options: &WriteOptions,
    ) -> Result<Outcome, CrmError> {
        let tz = self.time_zone();
        let module = self.module();
        let mut outcome = Outcome::default();
        for chunk in items.chunks_mut(self.client.settings().batch_size.max(1)) {
            let records = chunk
                .iter()
                .map(|(_, obj)| mapper::to_record(&**obj, &self.catalog, tz))
                .collect::<Result<Vec<_>, _>>()?;
            let request = kind.request(module, &records, options);
            let results = self
                .client
                .execute(&request)
                .await?
                .into_batch(module, request.operation)?;
            let mut rows = correlate(results, chunk.len()).map_err(|received| CrmError::BatchCountMismatch {
                action: kind.progressive(),
                module: module.to_string(),
                sent: chunk.len(),
                received,
            })?;
            for (row, (index, obj)) in (1u32..).zip(chunk.iter_mut()) {
                let Some(item) = rows.remove(&row) else {
                    continue;
                };
                match check_row(kind, obj.id(), &item) {
                    Ok(id) => {
                        let mut details = item.details;
                        details.id = id;
                        mapper::merge_record(&mut **obj, &details, &self.catalog, tz)?;
                        outcome.succeeded += 1;
                    }
                    Err(cause) => {
                        tracing::warn!(
                            module = %module,
                            action = kind.progressive(),
                            index = *index,
                            id = %obj.id(),
                            cause = %cause,
                            "row failed"
                        );
                        outcome.failures.push(FailedItem {
                            index: *index,
                            id: obj.id().to_string(),
                            cause,
                        });
                    }
                }
            }
        }
        Ok(outcome)
    }
}

fn records_of(response: Response, request: &Request) -> Result<Vec<Record>, CrmError> {
    response.into_records(&request.module, request.operation)
}

fn unexpected(request: &Request) -> CrmError {
    CrmError::UnknownResponseShape {
        module: request.module.clone(),
        operation: request.operation.as_str().to_string(),
    }
}

fn require_id<O: DataObject + ?Sized>(obj: &O) -> Result<(), CrmError> {
    if obj.has_id() {
        Ok(())
    } else {
        Err(CrmError::Validation("update requires a record id".into()))
    }
}

/// Results keyed by row number. Errors with the received count unless the rows are exactly
/// `1..=sent`.
fn correlate(results: Vec<BatchItemResult>, sent: usize) -> Result<BTreeMap<u32, BatchItemResult>, usize> {
    let received = results.len();
    let rows: BTreeMap<u32, BatchItemResult> = results.into_iter().map(|r| (r.row, r)).collect();
    let in_range = rows.keys().all(|&row| row >= 1 && row as usize <= sent);
    if received != sent || rows.len() != received || !in_range {
        return Err(received);
    }
    Ok(rows)
}

/// Id the object ends up with, or why the row did not synchronize it.
fn check_row(kind: WriteKind, sent_id: &str, item: &BatchItemResult) -> Result<String, FailureCause> {
    if !item.success {
        return Err(FailureCause::Rejected {
            code: item.error_code.clone().unwrap_or_default(),
            message: item.error_message.clone().unwrap_or_default(),
        });
    }
    let returned = item
        .assigned_id
        .clone()
        .or_else(|| Some(item.details.id.clone()))
        .filter(|id| !id.is_empty())
        .ok_or(FailureCause::MissingId)?;
    if kind == WriteKind::Update && returned != sent_id {
        return Err(FailureCause::IdMismatch {
            expected: sent_id.to_string(),
            returned,
        });
    }
    Ok(returned)
}
