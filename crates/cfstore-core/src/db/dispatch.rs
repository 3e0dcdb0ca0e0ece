use super::{Outcome, Store, StoreState};
use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    event::{Event, FetchTarget},
    model::Guid,
    normalize::{NormalizeError, NormalizedResponse, normalize},
    obs::sink::MetricsEvent,
    relation::{
        SpaceQuota, UserRelationType, apply_relation, apply_space_quota, apply_user_permission,
    },
    store::MergeMode,
};
use cfstore_schema::{cf, node::EntityKind};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

impl Store {
    /// Apply one event.
    ///
    /// Observers run after every event that changed state. Responses that
    /// fail to normalize are written into the owning request or page as an
    /// error and reported through [`Outcome::Recorded`]; they never escape
    /// as `Err`.
    pub fn dispatch(&mut self, event: Event) -> Outcome {
        let name = event.name();
        let _span = debug_span!("dispatch", event = name).entered();
        self.record(MetricsEvent::Dispatch { event: name });

        let outcome = self.apply(event);
        debug!(?outcome, "event applied");

        if outcome.changed_state() {
            self.notify();
        }

        outcome
    }

    #[expect(clippy::too_many_lines)]
    fn apply(&mut self, event: Event) -> Outcome {
        match event {
            // fetch
            Event::FetchStarted { kind, target } => {
                match target {
                    FetchTarget::Entity(id) => self.state_mut().requests.start_fetch(&kind, &id),
                    FetchTarget::Page { section, page } => {
                        let page_size = self.page_size(&section);
                        self.state_mut()
                            .pagination
                            .start_page(&section, page, Some(page_size));
                    }
                }
                Outcome::Applied
            }

            Event::FetchSucceeded {
                kind,
                target,
                response,
                mode,
            } => match normalize(&self.registry, kind.as_str(), &response) {
                Ok(normalized) => {
                    self.merge(&normalized, mode);

                    match target {
                        FetchTarget::Entity(id) => {
                            self.state_mut().requests.end_fetch(&kind, &id, None);
                        }
                        FetchTarget::Page { section, page } => {
                            let page_size = self.page_size(&section);
                            self.state_mut().pagination.on_page_success_of(
                                &section,
                                page,
                                &kind,
                                normalized.result,
                                normalized.total_results,
                                Some(page_size),
                            );
                        }
                    }
                    Outcome::Applied
                }
                Err(err) => {
                    let err = self.reject(&kind, err);
                    self.fail_fetch(&kind, target, &err.message);

                    Outcome::Recorded(err)
                }
            },

            Event::FetchFailed {
                kind,
                target,
                message,
            } => {
                let origin = match target {
                    FetchTarget::Entity(_) => ErrorOrigin::Request,
                    FetchTarget::Page { .. } => ErrorOrigin::Pagination,
                };
                let err = InternalError::new(ErrorClass::Fetch, origin, message);
                debug!(%kind, error = %err.display_with_class(), "fetch failed");
                self.record(MetricsEvent::RequestFailure {
                    kind: kind.as_str(),
                });
                self.fail_fetch(&kind, target, &err.message);

                Outcome::Applied
            }

            // update
            Event::UpdateStarted {
                kind,
                id,
                operation,
            } => {
                self.state_mut()
                    .requests
                    .start_update(&kind, &id, &operation);
                Outcome::Applied
            }

            Event::UpdateSucceeded {
                kind,
                id,
                operation,
                response,
            } => {
                let merged = match response {
                    Some(raw) => self.normalize_and_merge(&kind, &raw, MergeMode::Patch),
                    None => Ok(()),
                };

                match merged {
                    Ok(()) => {
                        self.state_mut()
                            .requests
                            .end_update(&kind, &id, &operation, None);
                        Outcome::Applied
                    }
                    Err(err) => {
                        self.state_mut().requests.end_update(
                            &kind,
                            &id,
                            &operation,
                            Some(&err.message),
                        );
                        Outcome::Recorded(err)
                    }
                }
            }

            Event::UpdateFailed {
                kind,
                id,
                operation,
                message,
            } => {
                self.record(MetricsEvent::RequestFailure {
                    kind: kind.as_str(),
                });
                self.state_mut()
                    .requests
                    .end_update(&kind, &id, &operation, Some(&message));
                Outcome::Applied
            }

            // create
            Event::CreateStarted { kind, id } => {
                self.state_mut().requests.start_create(&kind, &id);
                Outcome::Applied
            }

            Event::CreateSucceeded { kind, id, response } => {
                match self.normalize_and_merge(&kind, &response, MergeMode::Patch) {
                    Ok(()) => {
                        self.state_mut().requests.end_create(&kind, &id, None);
                        Outcome::Applied
                    }
                    Err(err) => {
                        self.state_mut()
                            .requests
                            .end_create(&kind, &id, Some(&err.message));
                        Outcome::Recorded(err)
                    }
                }
            }

            Event::CreateFailed { kind, id, message } => {
                self.record(MetricsEvent::RequestFailure {
                    kind: kind.as_str(),
                });
                self.state_mut()
                    .requests
                    .end_create(&kind, &id, Some(&message));
                Outcome::Applied
            }

            // delete
            Event::DeleteStarted { kind, id } => {
                self.state_mut().requests.start_delete(&kind, &id);
                Outcome::Applied
            }

            Event::DeleteSucceeded { kind, id } => {
                let state = self.state_mut();
                state.requests.end_delete(&kind, &id, None);
                let cached = state.entities.remove(kind.as_str(), id.as_str()).is_some();
                let sections = state.pagination.remove_id(kind.as_str(), id.as_str(), None);
                state.roles.remove(kind.as_str(), id.as_str());

                debug!(%kind, %id, cached, sections, "entity deleted");
                Outcome::Applied
            }

            Event::DeleteFailed { kind, id, message } => {
                self.record(MetricsEvent::RequestFailure {
                    kind: kind.as_str(),
                });
                self.state_mut()
                    .requests
                    .end_delete(&kind, &id, Some(&message));
                Outcome::Applied
            }

            // relations
            Event::RelationChanged {
                kind,
                id,
                relation_type,
                has_relation,
            } => {
                if UserRelationType::for_kind(&relation_type, kind.as_str()).is_none() {
                    debug!(
                        %kind,
                        %id,
                        relation_type = relation_type.as_str(),
                        "ignoring relation change"
                    );
                    self.record(MetricsEvent::RelationNoop);
                    return Outcome::Unchanged;
                }

                let roles = apply_relation(
                    self.state.roles.clone(),
                    &self.state.entities,
                    kind.as_str(),
                    &id,
                    &relation_type,
                    has_relation,
                );
                if roles == self.state.roles {
                    return Outcome::Unchanged;
                }

                self.state_mut().roles = roles;
                Outcome::Applied
            }

            Event::PermissionChanged(change) => {
                if let Some(missing) = self.uncached(&cf::USER, &change.user) {
                    return missing;
                }

                apply_user_permission(&mut self.state_mut().entities, &change);
                Outcome::Applied
            }

            Event::SpaceQuotaAssociated { space, response } => {
                if let Some(missing) = self.uncached(&cf::SPACE, &space) {
                    return missing;
                }
                let kind = cf::SPACE_QUOTA_DEFINITION;
                let normalized = match normalize(&self.registry, kind.as_str(), &response) {
                    Ok(normalized) => normalized,
                    Err(err) => return Outcome::Rejected(self.reject(&kind, err)),
                };
                let Some(guid) = normalized.result.first().cloned() else {
                    return Outcome::Rejected(InternalError::new(
                        ErrorClass::SchemaMismatch,
                        ErrorOrigin::Relation,
                        format!("no space quota definition in response for space {space}"),
                    ));
                };
                let url = normalized
                    .get(kind.as_str(), guid.as_str())
                    .and_then(|record| record.metadata.get("url"))
                    .and_then(Value::as_str)
                    .map(str::to_string);

                self.merge(&normalized, MergeMode::Patch);
                apply_space_quota(
                    &mut self.state_mut().entities,
                    &space,
                    Some(&SpaceQuota { guid, url }),
                );
                Outcome::Applied
            }

            Event::SpaceQuotaDisassociated { space } => {
                if let Some(missing) = self.uncached(&cf::SPACE, &space) {
                    return missing;
                }
                apply_space_quota(&mut self.state_mut().entities, &space, None);
                Outcome::Applied
            }

            // pagination
            Event::LocalPageRequested { section, config } => {
                let state = self.state_mut();
                state.pagination.set_client_config(&section, config);

                let entities = &state.entities;
                let page = state
                    .pagination
                    .local_page(&section, |id| entities.get(section.kind.as_str(), id.as_str()));
                state.pagination.set_local_total(&section, page.total_results);

                debug!(%section, total = page.total_results, pages = page.page_count, "local page");
                Outcome::Applied
            }

            Event::SetPage {
                section,
                page,
                keep_pages,
                force_local,
            } => {
                self.state_mut()
                    .pagination
                    .set_page(&section, page, keep_pages, force_local);
                Outcome::Applied
            }

            Event::SetClientPageSize { section, page_size } => {
                self.state_mut()
                    .pagination
                    .set_client_page_size(&section, page_size);
                Outcome::Applied
            }

            Event::SetClientPage { section, page } => {
                self.state_mut().pagination.set_client_page(&section, page);
                Outcome::Applied
            }

            Event::SetClientFilter { section, filter } => {
                self.state_mut()
                    .pagination
                    .set_client_filter(&section, filter);
                Outcome::Applied
            }

            Event::ClearPages { section } => {
                self.state_mut().pagination.clear_pages(&section);
                Outcome::Applied
            }

            Event::ResetPagination { section } => {
                self.state_mut().pagination.reset(&section);
                Outcome::Applied
            }

            Event::CreatePagination { section, seed } => {
                if self.state.pagination.section(&section).is_some() {
                    return Outcome::Unchanged;
                }
                let local_page_size = self.config.local_page_size;
                let pagination = &mut self.state_mut().pagination;
                pagination.create(&section, seed.as_deref());
                if seed.is_none() {
                    pagination.set_client_page_size(&section, local_page_size);
                }
                Outcome::Applied
            }

            Event::SetParams {
                section,
                params,
                keep_pages,
                overwrite,
            } => {
                self.state_mut()
                    .pagination
                    .set_params(&section, params, keep_pages, overwrite);
                Outcome::Applied
            }

            Event::SetInitialParams {
                section,
                params,
                keep_pages,
                overwrite,
            } => {
                let seeded = self
                    .state
                    .pagination
                    .section(&section)
                    .is_some_and(|state| !state.params.is_empty());
                if seeded {
                    return Outcome::Unchanged;
                }
                self.state_mut()
                    .pagination
                    .set_initial_params(&section, params, keep_pages, overwrite);
                Outcome::Applied
            }

            Event::AddParams {
                section,
                params,
                keep_pages,
            } => {
                self.state_mut()
                    .pagination
                    .add_params(&section, params, keep_pages);
                Outcome::Applied
            }

            Event::RemoveParams {
                section,
                params,
                keep_pages,
            } => {
                self.state_mut()
                    .pagination
                    .remove_params(&section, &params, keep_pages);
                Outcome::Applied
            }

            Event::SetPageBusy {
                section,
                page,
                busy,
                error,
            } => {
                self.state_mut()
                    .pagination
                    .set_page_busy(&section, page, busy, error.as_deref());
                Outcome::Applied
            }

            Event::SetResultCount { section, count } => {
                self.state_mut()
                    .pagination
                    .set_result_count(&section, count);
                Outcome::Applied
            }

            Event::UpdateMaxedState {
                section,
                max,
                all_entities,
                forced_kind,
            } => {
                let max = max.unwrap_or(self.config.max_local_results);
                self.state_mut().pagination.update_maxed_state(
                    &section,
                    max,
                    all_entities,
                    forced_kind.as_ref().map(EntityKind::as_str),
                );
                Outcome::Applied
            }

            Event::ClearPaginationOfType { kind } => {
                self.state_mut().pagination.clear_of_type(kind.as_str());
                Outcome::Applied
            }

            Event::ClearPaginationOfEntity { kind, id, section } => {
                let touched = self.state_mut().pagination.clear_of_entity(
                    kind.as_str(),
                    id.as_str(),
                    section.as_deref(),
                );
                if touched == 0 {
                    return Outcome::Unchanged;
                }
                Outcome::Applied
            }

            // cache
            Event::Patch { kind, id, fields } => {
                if let Some(missing) = self.uncached(&kind, &id) {
                    return missing;
                }

                self.state_mut()
                    .entities
                    .patch(kind.as_str(), id.as_str(), &fields);
                Outcome::Applied
            }
        }
    }

    ///
    /// HELPERS
    ///

    // Clones the state only while a snapshot is still shared.
    fn state_mut(&mut self) -> &mut StoreState {
        Arc::make_mut(&mut self.state)
    }

    /// `Rejected` outcome for an event addressing an entity not in the cache.
    fn uncached(&self, kind: &EntityKind, id: &Guid) -> Option<Outcome> {
        (!self.state.entities.contains(kind.as_str(), id.as_str())).then(|| {
            Outcome::Rejected(InternalError::entity_not_found(kind.as_str(), id.as_str()))
        })
    }

    fn normalize_and_merge(
        &mut self,
        kind: &EntityKind,
        raw: &Value,
        mode: MergeMode,
    ) -> Result<(), InternalError> {
        match normalize(&self.registry, kind.as_str(), raw) {
            Ok(normalized) => {
                self.merge(&normalized, mode);
                Ok(())
            }
            Err(err) => Err(self.reject(kind, err)),
        }
    }

    fn merge(&mut self, normalized: &NormalizedResponse, mode: MergeMode) {
        let stats = self
            .state_mut()
            .entities
            .merge_in_place(normalized, mode);

        self.record(MetricsEvent::Merge {
            kind: normalized.kind.as_str(),
            inserted: stats.inserted,
            updated: stats.updated,
        });
    }

    fn reject(&self, kind: &EntityKind, err: NormalizeError) -> InternalError {
        let err = InternalError::from(err);
        warn!(%kind, error = %err.display_with_class(), "response rejected");
        self.record(MetricsEvent::Rejected {
            kind: kind.as_str(),
        });

        err
    }

    fn fail_fetch(&mut self, kind: &EntityKind, target: FetchTarget, message: &str) {
        let state = self.state_mut();
        match target {
            FetchTarget::Entity(id) => state.requests.end_fetch(kind, &id, Some(message)),
            FetchTarget::Page { section, page } => {
                state.pagination.on_page_error(&section, page, message);
            }
        }
    }
}
