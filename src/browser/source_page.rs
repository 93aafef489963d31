use async_trait::async_trait;
use chromiumoxide::page::Page;
use serde_json::Value;

use super::{BrowserError, evaluate, page_url};
use crate::extractor::{ExtractError, SourcePage};
use crate::page_extractor::StateProbe;
use crate::page_extractor::js_scripts::{
    INLINE_SCRIPTS, INSTALL_MUTATION_COUNTER, PROBE_STATE, READ_STATE, REMOVE_MUTATION_COUNTER,
};

/// [`SourcePage`] backed by a live Chrome tab
pub struct ChromeSourcePage {
    page: Page,
}

impl ChromeSourcePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}

impl From<BrowserError> for ExtractError {
    fn from(e: BrowserError) -> Self {
        ExtractError::Page(e.to_string())
    }
}

#[async_trait]
impl SourcePage for ChromeSourcePage {
    async fn current_url(&self) -> Result<String, ExtractError> {
        Ok(page_url(&self.page).await?)
    }

    async fn probe_state(&self) -> Result<StateProbe, ExtractError> {
        Ok(evaluate(&self.page, PROBE_STATE).await?)
    }

    async fn read_state(&self) -> Result<Option<Value>, ExtractError> {
        let state: Value = evaluate(&self.page, READ_STATE).await?;
        Ok((!state.is_null()).then_some(state))
    }

    async fn inline_scripts(&self) -> Result<Vec<String>, ExtractError> {
        Ok(evaluate(&self.page, INLINE_SCRIPTS).await?)
    }

    async fn mutation_count(&self) -> Result<u64, ExtractError> {
        Ok(evaluate(&self.page, INSTALL_MUTATION_COUNTER).await?)
    }

    async fn stop_observing(&self) -> Result<(), ExtractError> {
        let _: bool = evaluate(&self.page, REMOVE_MUTATION_COUNTER).await?;
        Ok(())
    }
}
