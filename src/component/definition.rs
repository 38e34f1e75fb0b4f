//! Closure-based component definitions

use std::borrow::Cow;
use std::fmt;

use super::{Bindings, Component, ComponentLogic, Props};
use crate::RenderError;

type BuildFn = Box<dyn Fn(&Props, &mut Bindings)>;
type MountFn = Box<dyn Fn(&Component)>;

/// A [`ComponentLogic`] assembled from a template string and closures.
///
/// Parts that are never supplied fail the same way an unimplemented trait
/// method does.
#[derive(Default)]
pub struct Definition {
    template: Option<Cow<'static, str>>,
    build: Option<BuildFn>,
    on_mount: Option<MountFn>,
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("template", &self.template)
            .field("build", &self.build.is_some())
            .field("on_mount", &self.on_mount.is_some())
            .finish()
    }
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, template: impl Into<Cow<'static, str>>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn build(mut self, build: impl Fn(&Props, &mut Bindings) + 'static) -> Self {
        self.build = Some(Box::new(build));
        self
    }

    pub fn on_mount(mut self, on_mount: impl Fn(&Component) + 'static) -> Self {
        self.on_mount = Some(Box::new(on_mount));
        self
    }
}

impl ComponentLogic for Definition {
    fn template(&self) -> Result<Cow<'_, str>, RenderError> {
        match &self.template {
            Some(template) => Ok(Cow::Borrowed(template.as_ref())),
            None => Err(RenderError::Unimplemented {
                operation: "template",
            }),
        }
    }

    fn build(&self, props: &Props, bindings: &mut Bindings) -> Result<(), RenderError> {
        match &self.build {
            Some(build) => {
                build(props, bindings);
                Ok(())
            }
            None => Err(RenderError::Unimplemented { operation: "build" }),
        }
    }

    fn on_mount(&self, component: &Component) {
        if let Some(on_mount) = &self.on_mount {
            on_mount(component);
        }
    }
}
