//! The reconciliation engine shared by every resource
//!
//! A `Reconciler` knows one resource type: its schema, its collection and
//! how to move values between host state and the peer object. The engine
//! turns it into a host resource by running the same create, read, update,
//! delete and import sequences for all of them.

use async_trait::async_trait;
use std::time::Duration;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::Schema;
use tfplug::types::{has_errors, AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::{
    import_state_passthrough_id, Context, Resource, ResourceWithConfigure,
    ResourceWithImportState,
};
use uuid::Uuid;

use super::diagnostics;
use super::state::{preserve_sensitive, Attrs, StateBuilder};
use crate::api::{ApiError, ApiRevision, AppgateApiResource, Client, Collection};
use crate::provider_data::AppgateProviderData;

/// Deadline of one create, update or delete
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Resource-specific half of a managed resource
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    type Model: AppgateApiResource + Default;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Oldest API revision that has this resource at all
    fn min_revision(&self) -> ApiRevision {
        ApiRevision::MIN
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model>;

    /// Ids are generated on this side; the peer stores what it is given
    fn assign_id(&self, model: &mut Self::Model) {
        model.set_id(Uuid::new_v4().to_string());
    }

    /// Writes the planned attributes onto `model`. On update `model` is the
    /// object just fetched, so anything left alone keeps its peer value.
    fn expand(
        &self,
        schema: &Schema,
        planned: &Dynamic,
        revision: ApiRevision,
        model: &mut Self::Model,
    ) -> Result<(), Diagnostic>;

    /// Projects the peer object into state. Sensitive attributes may be left
    /// null; the engine fills them from prior state.
    fn flatten(&self, schema: &Schema, model: &Self::Model, revision: ApiRevision) -> StateBuilder;

    /// Computed outputs that need another call to the peer
    async fn after_read(
        &self,
        _ctx: &Context,
        _client: &Client,
        _model: &Self::Model,
        _prior: &Dynamic,
        state: StateBuilder,
    ) -> Result<StateBuilder, ApiError> {
        Ok(state)
    }

    async fn before_delete(
        &self,
        _ctx: &Context,
        _client: &Client,
        _model: &Self::Model,
    ) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Host resource driving a `Reconciler`
pub struct ManagedResource<R: Reconciler> {
    reconciler: R,
    schema: Schema,
    provider_data: Option<AppgateProviderData>,
}

impl<R: Reconciler> ManagedResource<R> {
    pub fn new(reconciler: R) -> Self {
        let schema = reconciler.schema();
        Self {
            reconciler,
            schema,
            provider_data: None,
        }
    }

    pub fn reconciler(&self) -> &R {
        &self.reconciler
    }

    fn client(&self) -> Result<&Client, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| &data.client)
            .ok_or_else(diagnostics::not_configured)
    }

    fn api_error(&self, action: &str, error: &ApiError) -> Vec<Diagnostic> {
        let summary = format!("Failed to {} {}", action, self.reconciler.type_name());
        diagnostics::api_error(&summary, error, &self.schema)
    }

    fn planned(&self, planned: &DynamicValue) -> DynamicValue {
        let mut planned = planned.clone();
        self.schema.apply_defaults(&mut planned);
        planned
    }

    /// Resource-level and field-level version checks against the active revision
    fn check_revision(&self, client: &Client, planned: &Dynamic) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if let Err(e) = client.require(self.reconciler.min_revision(), self.reconciler.type_name())
        {
            diags.extend(self.api_error("plan", &e));
        }

        let shape = self.reconciler.collection(client).shape();
        let unmet = shape.unmet(client.revision(), planned);
        diags.extend(diagnostics::unmet_gates(&unmet, client.revision()));
        diags
    }

    /// State without the extra calls of `after_read`, for when those failed
    fn project_offline(&self, client: &Client, model: &R::Model, prior: &Dynamic) -> DynamicValue {
        let mut value = self
            .reconciler
            .flatten(&self.schema, model, client.revision())
            .into_dynamic();
        preserve_sensitive(&self.schema.block, prior, &mut value);
        DynamicValue::new(value)
    }

    async fn project(
        &self,
        ctx: &Context,
        client: &Client,
        model: &R::Model,
        prior: &Dynamic,
    ) -> Result<DynamicValue, ApiError> {
        let state = self
            .reconciler
            .flatten(&self.schema, model, client.revision());
        let state = self
            .reconciler
            .after_read(ctx, client, model, prior, state)
            .await?;
        let mut value = state.into_dynamic();
        preserve_sensitive(&self.schema.block, prior, &mut value);
        Ok(DynamicValue::new(value))
    }

    /// `None` when the object is gone
    async fn read_state(
        &self,
        ctx: &Context,
        client: &Client,
        id: &str,
        prior: &Dynamic,
    ) -> Result<Option<DynamicValue>, ApiError> {
        let model = match self.reconciler.collection(client).get(ctx, id).await {
            Ok(model) => model,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        self.project(ctx, client, &model, prior).await.map(Some)
    }
}

fn state_id(state: &DynamicValue) -> Option<String> {
    Attrs::of(state).non_empty_string("id")
}

#[async_trait]
impl<R: Reconciler> Resource for ManagedResource<R> {
    fn type_name(&self) -> &str {
        self.reconciler.type_name()
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.reconciler.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: self.schema.clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: self.schema.validate_config(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                }
            }
        };
        let ctx = ctx.with_timeout(OPERATION_TIMEOUT);
        let planned = self.planned(&request.planned_state);

        diagnostics.extend(self.check_revision(client, &planned.value));
        if has_errors(&diagnostics) {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        let mut model = R::Model::default();
        self.reconciler.assign_id(&mut model);
        if let Err(diag) =
            self.reconciler
                .expand(&self.schema, &planned.value, client.revision(), &mut model)
        {
            diagnostics.push(diag);
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        tracing::debug!(
            "Creating {} {} on API {}",
            self.reconciler.type_name(),
            model.id(),
            client.revision()
        );
        let created = match self.reconciler.collection(client).post(&ctx, &model).await {
            Ok(created) => created,
            Err(e) => {
                diagnostics.extend(self.api_error("create", &e));
                // The peer may hold the object already, so state keeps its id
                let new_state = if e.may_have_reached_peer() && !model.id().is_empty() {
                    self.project_offline(client, &model, &planned.value)
                } else {
                    DynamicValue::null()
                };
                return CreateResourceResponse {
                    new_state,
                    diagnostics,
                };
            }
        };

        let id = if created.id().is_empty() {
            model.id().to_string()
        } else {
            created.id().to_string()
        };

        let new_state = match self.read_state(&ctx, client, &id, &planned.value).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to read {}", self.reconciler.type_name()),
                    format!("Object {} disappeared right after it was created", id),
                ));
                self.project_offline(client, &created, &planned.value)
            }
            Err(e) => {
                diagnostics.extend(self.api_error("read", &e));
                self.project_offline(client, &created, &planned.value)
            }
        };

        CreateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                    deferred: None,
                }
            }
        };

        let Some(id) = state_id(&request.current_state) else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
                deferred: None,
            };
        };

        let new_state = match self
            .read_state(&ctx, client, &id, &request.current_state.value)
            .await
        {
            Ok(Some(state)) => Some(state),
            Ok(None) => {
                tracing::warn!(
                    "{} {} not found, removing it from state",
                    self.reconciler.type_name(),
                    id
                );
                None
            }
            Err(e) => {
                diagnostics.extend(self.api_error("read", &e));
                Some(request.current_state)
            }
        };

        ReadResourceResponse {
            new_state,
            diagnostics,
            deferred: None,
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return UpdateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                }
            }
        };
        let ctx = ctx.with_timeout(OPERATION_TIMEOUT);

        let Some(id) = state_id(&request.prior_state) else {
            diagnostics.push(Diagnostic::error(
                format!("Failed to update {}", self.reconciler.type_name()),
                "Prior state has no id",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let planned = self.planned(&request.planned_state);
        diagnostics.extend(self.check_revision(client, &planned.value));
        if has_errors(&diagnostics) {
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let collection = self.reconciler.collection(client);
        let mut model = match collection.get(&ctx, &id).await {
            Ok(model) => model,
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "{} {} vanished before update",
                    self.reconciler.type_name(),
                    id
                );
                diagnostics.push(Diagnostic::warning(
                    "Object no longer exists",
                    format!(
                        "{} {} was deleted outside of this configuration; the next refresh drops it from state",
                        self.reconciler.type_name(),
                        id
                    ),
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
            Err(e) => {
                diagnostics.extend(self.api_error("read", &e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        if let Err(diag) =
            self.reconciler
                .expand(&self.schema, &planned.value, client.revision(), &mut model)
        {
            diagnostics.push(diag);
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }
        model.set_id(id.clone());

        tracing::debug!(
            "Updating {} {} on API {}",
            self.reconciler.type_name(),
            id,
            client.revision()
        );
        if let Err(e) = collection.put(&ctx, &model).await {
            diagnostics.extend(self.api_error("update", &e));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let new_state = match self.read_state(&ctx, client, &id, &planned.value).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to read {}", self.reconciler.type_name()),
                    format!("Object {} disappeared right after it was updated", id),
                ));
                self.project_offline(client, &model, &planned.value)
            }
            Err(e) => {
                diagnostics.extend(self.api_error("read", &e));
                self.project_offline(client, &model, &planned.value)
            }
        };

        UpdateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diag],
                }
            }
        };
        let ctx = ctx.with_timeout(OPERATION_TIMEOUT);

        let Some(id) = state_id(&request.prior_state) else {
            return DeleteResourceResponse { diagnostics };
        };

        let collection = self.reconciler.collection(client);
        let model = match collection.get(&ctx, &id).await {
            Ok(model) => model,
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} {} already deleted", self.reconciler.type_name(), id);
                return DeleteResourceResponse { diagnostics };
            }
            Err(e) => {
                diagnostics.extend(self.api_error("delete", &e));
                return DeleteResourceResponse { diagnostics };
            }
        };

        if let Err(e) = self.reconciler.before_delete(&ctx, client, &model).await {
            diagnostics.extend(self.api_error("delete", &e));
            return DeleteResourceResponse { diagnostics };
        }

        tracing::debug!("Deleting {} {}", self.reconciler.type_name(), id);
        match collection.delete(&ctx, &id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} {} already deleted", self.reconciler.type_name(), id);
            }
            Err(e) => diagnostics.extend(self.api_error("delete", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<R: Reconciler> ResourceWithConfigure for ManagedResource<R> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<AppgateProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract AppgateProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<R: Reconciler> ResourceWithImportState for ManagedResource<R> {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
            deferred: None,
        };

        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        if has_errors(&response.diagnostics) {
            return response;
        }

        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };

        match self
            .read_state(&ctx, client, &request.id, &Dynamic::Null)
            .await
        {
            Ok(Some(state)) => {
                response.imported_resources = vec![ImportedResource {
                    type_name: request.type_name.clone(),
                    state,
                }];
            }
            Ok(None) => {
                response.imported_resources.clear();
                response.diagnostics.push(Diagnostic::error(
                    "Cannot import non-existent remote object",
                    format!(
                        "{} {} does not exist on the collective",
                        self.reconciler.type_name(),
                        request.id
                    ),
                ));
            }
            Err(e) => {
                response.imported_resources.clear();
                response.diagnostics.extend(self.api_error("import", &e));
            }
        }

        response
    }
}
