//! Minimal entity shared by the unit tests of this crate.

use crate::entity::OwnedEntity;
use crate::error::ServiceError;
use async_trait::async_trait;

crate::define_id!(Note);

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub topic: Option<u32>,
}

#[derive(Debug)]
pub struct NoteCreate {
    pub text: String,
}

#[derive(Debug, Default)]
pub struct NotePatch {
    pub text: Option<String>,
}

#[derive(Debug)]
pub enum NoteAction {
    Tag(u32),
    Untag,
}

#[async_trait]
impl OwnedEntity for Note {
    type Id = NoteId;
    type Create = NoteCreate;
    type Patch = NotePatch;
    type Filter = u32;
    type Action = NoteAction;
    type ActionResult = ();
    type Context = ();

    fn id(&self) -> &NoteId {
        &self.id
    }

    fn from_create_params(id: NoteId, params: NoteCreate) -> Result<Self, ServiceError> {
        Ok(Self {
            id,
            text: params.text,
            topic: None,
        })
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("text {}", self.text))
    }

    fn matches(&self, topic: &u32) -> bool {
        self.topic == Some(*topic)
    }

    async fn on_update(&mut self, patch: NotePatch, _: &()) -> Result<(), ServiceError> {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if self.text.trim().is_empty() {
            return Err(ServiceError::Validation("text must not be blank".into()));
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: NoteAction, _: &()) -> Result<(), ServiceError> {
        match action {
            NoteAction::Tag(topic) => self.topic = Some(topic),
            NoteAction::Untag => self.topic = None,
        }
        Ok(())
    }
}
