use crate::error::{Error, ErrorKind, ErrorOrigin, LoadErrorKind};
use lensdb_core::key::InstanceKey;

///
/// Response
///
/// Ordered instance keys produced by one load execution. Extractors consume
/// the response; cardinality failures surface as load errors.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    entity: String,
    keys: Vec<InstanceKey>,
}

impl Response {
    pub(crate) const fn new(entity: String, keys: Vec<InstanceKey>) -> Self {
        Self { entity, keys }
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstanceKey> {
        self.keys.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&InstanceKey> {
        self.keys.first()
    }

    // ------------------------------------------------------------------
    // Extractors (consume self)
    // ------------------------------------------------------------------

    #[must_use]
    pub fn keys(self) -> Vec<InstanceKey> {
        self.keys
    }

    /// Exactly one instance, or a load error.
    pub fn one(self) -> Result<InstanceKey, Error> {
        match self.one_opt()? {
            Some(key) => Ok(key),
            None => Err(Error::new(
                ErrorKind::Load(LoadErrorKind::NotFound),
                ErrorOrigin::Loader,
                "no instance matched the load request",
            )),
        }
    }

    /// At most one instance, or a load error.
    pub fn one_opt(mut self) -> Result<Option<InstanceKey>, Error> {
        if self.keys.len() > 1 {
            return Err(Error::new(
                ErrorKind::Load(LoadErrorKind::NotUnique),
                ErrorOrigin::Loader,
                format!(
                    "load request for '{}' expected one instance, matched {}",
                    self.entity,
                    self.keys.len()
                ),
            ));
        }

        Ok(self.keys.pop())
    }
}
