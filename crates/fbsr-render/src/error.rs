/// Errors raised while building or painting draw operations.
///
/// Most of these are caught per operation and recorded in the caller's
/// `Reporting`; only option parsing and an empty canvas abort a render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid render options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
    #[error("sprite '{sprite}' of '{entity}' has an empty source region")]
    EmptySprite { entity: String, sprite: String },
    #[error("invalid field '{field}' on entity '{entity}': {detail}")]
    InvalidField {
        entity: String,
        field: &'static str,
        detail: String,
    },
    #[error("no recipe '{recipe}' for '{entity}'")]
    UnknownRecipe { entity: String, recipe: String },
    #[error("canvas would be empty ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("failed to paint {what}")]
    Paint {
        what: String,
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// Wrap an error with the name of the thing being painted.
    pub fn painting(what: impl Into<String>, source: RenderError) -> Self {
        RenderError::Paint {
            what: what.into(),
            source: Box::new(source),
        }
    }
}
