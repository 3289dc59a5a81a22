//! Riddle service - the user actions behind the API
//!
//! Per theme, three actions run independently of each other:
//! - Generate the next riddle (history grows by one on success)
//! - Improve a riddle description (description replaced on success)
//! - Request images for a riddle
//!
//! A second submission of an action that is still in flight is rejected.
//! History is reloaded from the store for every action. Changes are applied
//! to the history as it is at save time, under the store's write lock.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::error::ServiceError;
use crate::images::{generate_riddle_images, ImageStore, SavedImage, StoredImage};
use crate::locale::{Action, Locale};
use crate::riddle::{GeneratedRiddle, Riddle, RiddlePipeline};
use crate::store::RiddleStore;
use crate::theme::{Theme, ThemeCatalog};

/// Identifies one running action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ActionKey {
    theme_id: u32,
    action: Action,
    riddle_number: Option<u32>,
}

/// Actions currently running
#[derive(Debug, Default)]
struct InFlight {
    active: Mutex<HashSet<ActionKey>>,
}

impl InFlight {
    fn begin(&self, key: ActionKey) -> Result<InFlightGuard<'_>, ServiceError> {
        if !self.active.lock().insert(key) {
            return Err(ServiceError::Busy(key.action));
        }
        Ok(InFlightGuard { owner: self, key })
    }
}

/// Clears its action when dropped
struct InFlightGuard<'a> {
    owner: &'a InFlight,
    key: ActionKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.active.lock().remove(&self.key);
    }
}

/// Theme selection, generation and persistence
pub struct RiddleService {
    catalog: ThemeCatalog,
    pipeline: RiddlePipeline,
    store: RiddleStore,
    images: ImageStore,
    in_flight: InFlight,
}

impl RiddleService {
    pub fn new(
        catalog: ThemeCatalog,
        pipeline: RiddlePipeline,
        store: RiddleStore,
        images: ImageStore,
    ) -> Self {
        Self {
            catalog,
            pipeline,
            store,
            images,
            in_flight: InFlight::default(),
        }
    }

    /// Create a shared instance
    pub fn shared(
        catalog: ThemeCatalog,
        pipeline: RiddlePipeline,
        store: RiddleStore,
        images: ImageStore,
    ) -> Arc<Self> {
        Arc::new(Self::new(catalog, pipeline, store, images))
    }

    /// All selectable themes
    pub fn themes(&self) -> &[Theme] {
        self.catalog.list()
    }

    /// Look up a theme
    pub fn theme(&self, theme_id: u32) -> Result<&Theme, ServiceError> {
        self.catalog
            .get(theme_id)
            .ok_or(ServiceError::UnknownTheme(theme_id))
    }

    /// Message language for a theme; English when the theme is unknown
    pub fn locale(&self, theme_id: u32) -> Locale {
        self.catalog
            .get(theme_id)
            .map(|t| Locale::detect(&t.title))
            .unwrap_or(Locale::English)
    }

    /// Select a theme: its persisted history
    pub async fn history(&self, theme_id: u32) -> Result<Vec<Riddle>, ServiceError> {
        let theme = self.theme(theme_id)?;
        Ok(self.store.history(&theme.store_key()).await?)
    }

    /// Generate the next riddle of a theme and persist it
    pub async fn generate_next(&self, theme_id: u32) -> Result<GeneratedRiddle, ServiceError> {
        let theme = self.theme(theme_id)?;
        let _guard = self.in_flight.begin(ActionKey {
            theme_id,
            action: Action::Generate,
            riddle_number: None,
        })?;

        let history = self.store.history(&theme.store_key()).await?;

        let generated = self
            .pipeline
            .generate_next(theme, &history)
            .await
            .map_err(|source| ServiceError::Action {
                action: Action::Generate,
                source,
            })?;

        let riddle = generated.riddle.clone();
        self.store
            .update(&theme.store_key(), |history| history.push(riddle))
            .await?;

        info!(
            "Riddle #{} '{}' saved for theme {}",
            generated.riddle.riddle_number, generated.riddle.title, theme_id
        );
        Ok(generated)
    }

    /// Rewrite a riddle description and persist it
    pub async fn improve(&self, theme_id: u32, riddle_number: u32) -> Result<Riddle, ServiceError> {
        let theme = self.theme(theme_id)?;
        let _guard = self.in_flight.begin(ActionKey {
            theme_id,
            action: Action::Improve,
            riddle_number: Some(riddle_number),
        })?;

        let history = self.store.history(&theme.store_key()).await?;
        let original = find_riddle(&history, theme_id, riddle_number)?;

        let description = self
            .pipeline
            .improve_description(&original.description)
            .await
            .map_err(|source| ServiceError::Action {
                action: Action::Improve,
                source,
            })?;

        let improved = self
            .store
            .update(&theme.store_key(), |history| {
                for riddle in history.iter_mut() {
                    if riddle.riddle_number == riddle_number {
                        riddle.description = description.clone();
                    }
                }
                find_riddle(history, theme_id, riddle_number)
            })
            .await??;

        info!(
            "Description of riddle #{} improved for theme {}",
            riddle_number, theme_id
        );
        Ok(improved)
    }

    /// Generate images for a riddle
    pub async fn request_images(
        &self,
        theme_id: u32,
        riddle_number: u32,
    ) -> Result<Vec<SavedImage>, ServiceError> {
        let theme = self.theme(theme_id)?;
        let _guard = self.in_flight.begin(ActionKey {
            theme_id,
            action: Action::Images,
            riddle_number: Some(riddle_number),
        })?;

        let history = self.store.history(&theme.store_key()).await?;
        let riddle = find_riddle(&history, theme_id, riddle_number)?;

        generate_riddle_images(&self.pipeline, &self.images, &riddle).await
    }

    /// A previously generated image, for download
    pub async fn image(&self, hash: &str) -> Result<StoredImage, ServiceError> {
        self.images
            .get(hash)
            .await?
            .ok_or_else(|| ServiceError::ImageNotFound(hash.to_string()))
    }
}

fn find_riddle(history: &[Riddle], theme_id: u32, riddle_number: u32) -> Result<Riddle, ServiceError> {
    history
        .iter()
        .find(|r| r.riddle_number == riddle_number)
        .cloned()
        .ok_or(ServiceError::RiddleNotFound {
            theme_id,
            riddle_number,
        })
}
