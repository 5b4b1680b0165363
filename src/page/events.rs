use std::collections::HashMap;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The page has been loaded.
    DomContentLoaded,
    /// A form on the page was submitted.
    Submit
}

/// Field values of a submitted form, keyed by input id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSubmission {
    pub form_id: String,
    fields: HashMap<String, String>
}

impl FormSubmission {
    pub fn new(form_id: &str) -> FormSubmission {
        FormSubmission { form_id: form_id.to_owned(), fields: HashMap::new() }
    }

    pub fn from_fields(form_id: &str, fields: HashMap<String, String>) -> FormSubmission {
        FormSubmission { form_id: form_id.to_owned(), fields }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> FormSubmission {
        self.fields.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    DomContentLoaded,
    Submit(FormSubmission)
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::DomContentLoaded => EventKind::DomContentLoaded,
            Event::Submit(_) => EventKind::Submit
        }
    }
}

pub type Handler<C, E> = fn(&mut C, &Event) -> Result<(), E>;

struct Registration<C, E> {
    kind: EventKind,
    name: &'static str,
    handler: Handler<C, E>
}

/// Named handlers registered against event kinds. Handlers for one event
/// run in registration order, each to completion, stopping at the first error.
pub struct Dispatcher<C, E> {
    registrations: Vec<Registration<C, E>>
}

impl<C, E> Default for Dispatcher<C, E> {
    fn default() -> Self {
        Dispatcher { registrations: Vec::new() }
    }
}

impl<C, E> Dispatcher<C, E> {
    pub fn new() -> Self {
        Dispatcher::default()
    }

    pub fn on(&mut self, kind: EventKind, name: &'static str, handler: Handler<C, E>) -> &mut Self {
        self.registrations.push(Registration { kind, name, handler });
        self
    }

    pub fn handler_names(&self, kind: EventKind) -> Vec<&'static str> {
        self.registrations.iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.name)
            .collect()
    }

    pub fn dispatch(&self, context: &mut C, event: &Event) -> Result<(), E> {
        let kind = event.kind();
        for registration in self.registrations.iter().filter(|r| r.kind == kind) {
            debug!("dispatching {:?} to {}", kind, registration.name);
            (registration.handler)(context, event)?;
        }
        return Ok(());
    }
}
