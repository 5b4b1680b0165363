use log::warn;
use thiserror::Error;

use crate::backend::KeyValueStore;
use crate::config::CorruptDataPolicy;
use crate::core::{Amount, Ledger, LedgerError};
use crate::page::document::{Document, DocumentError, Page, AMOUNT_INPUT, RECIPIENT_INPUT, SEND_FORM_ID};
use crate::page::events::{Dispatcher, Event, EventKind, FormSubmission};
use crate::page::render::{render, render_history};

/// The only message shown for a rejected transfer, whatever the reason.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input or insufficient balance.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("form submitted before the page finished loading")]
    NotLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Uninitialized,
    Hydrated
}

/// Everything a page's handlers work on during one visit.
pub struct Session<S, D> {
    pub ledger: Ledger,
    pub store: S,
    pub document: D,
    pub policy: CorruptDataPolicy,
    pub state: PageState
}

/// One page visit: its state and the handlers wired to its events.
pub struct App<S, D = Page> {
    session: Session<S, D>,
    dispatcher: Dispatcher<Session<S, D>, AppError>
}

impl<S: KeyValueStore, D: Document> App<S, D> {
    fn with_dispatcher(store: S, document: D, policy: CorruptDataPolicy, dispatcher: Dispatcher<Session<S, D>, AppError>) -> Self {
        let session = Session {
            ledger: Ledger::new(),
            store,
            document,
            policy,
            state: PageState::Uninitialized
        };
        App { session, dispatcher }
    }

    /// Balance page: loads everything on page load and handles the send form.
    pub fn account_page(store: S, document: D, policy: CorruptDataPolicy) -> Self {
        let mut dispatcher: Dispatcher<Session<S, D>, AppError> = Dispatcher::new();
        dispatcher
            .on(EventKind::DomContentLoaded, "load_data", load_data::<S, D>)
            .on(EventKind::Submit, "send_money", send_money::<S, D>);
        App::with_dispatcher(store, document, policy, dispatcher)
    }

    /// Read-only page listing past transfers.
    pub fn history_page(store: S, document: D, policy: CorruptDataPolicy) -> Self {
        let mut dispatcher: Dispatcher<Session<S, D>, AppError> = Dispatcher::new();
        dispatcher.on(EventKind::DomContentLoaded, "load_transaction_history", load_transaction_history::<S, D>);
        App::with_dispatcher(store, document, policy, dispatcher)
    }

    pub fn dispatch(&mut self, event: &Event) -> Result<(), AppError> {
        self.dispatcher.dispatch(&mut self.session, event)
    }

    pub fn load(&mut self) -> Result<(), AppError> {
        self.dispatch(&Event::DomContentLoaded)
    }

    pub fn submit(&mut self, form: FormSubmission) -> Result<(), AppError> {
        self.dispatch(&Event::Submit(form))
    }

    /// Submits the send form with raw input values, as typed by the user.
    pub fn send(&mut self, recipient: &str, amount: &str) -> Result<(), AppError> {
        self.submit(FormSubmission::new(SEND_FORM_ID)
            .with_field(RECIPIENT_INPUT, recipient)
            .with_field(AMOUNT_INPUT, amount))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.session.ledger
    }

    pub fn store(&self) -> &S {
        &self.session.store
    }

    pub fn document(&self) -> &D {
        &self.session.document
    }

    pub fn state(&self) -> PageState {
        self.session.state
    }

    pub fn dispatcher(&self) -> &Dispatcher<Session<S, D>, AppError> {
        &self.dispatcher
    }

    pub fn into_document(self) -> D {
        self.session.document
    }
}

/// Amount as typed into the form. Like a browser's `parseFloat`, the longest
/// leading number counts and whatever follows it is ignored, so `"12abc"`
/// is `12`. Input that does not start with a finite number is rejected.
pub fn parse_amount(input: &str) -> Option<Amount> {
    let input = input.trim_start();
    let bytes = input.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count()
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let whole = digits_from(end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if whole + fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole + fraction == 0 {
        return None;
    }

    // an exponent only counts when it has digits
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_digits = digits_from(exponent);
        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }

    input[..end].parse::<Amount>().ok().filter(|amount| amount.is_finite())
}

fn load_data<S: KeyValueStore, D: Document>(session: &mut Session<S, D>, _: &Event) -> Result<(), AppError> {
    session.ledger.hydrate_with(&session.store, session.policy)?;
    session.state = PageState::Hydrated;
    render(&session.ledger, &mut session.document)?;
    return Ok(());
}

fn load_transaction_history<S: KeyValueStore, D: Document>(session: &mut Session<S, D>, _: &Event) -> Result<(), AppError> {
    let history = Ledger::load_history(&session.store, session.policy)?;
    session.state = PageState::Hydrated;
    render_history(&history, &mut session.document)?;
    return Ok(());
}

fn send_money<S: KeyValueStore, D: Document>(session: &mut Session<S, D>, event: &Event) -> Result<(), AppError> {
    let form = match event {
        Event::Submit(form) if form.form_id == SEND_FORM_ID => form,
        _ => return Ok(())
    };
    if session.state != PageState::Hydrated {
        return Err(AppError::NotLoaded);
    }

    let recipient = form.field(RECIPIENT_INPUT).unwrap_or_default();
    let amount = match form.field(AMOUNT_INPUT).and_then(parse_amount) {
        Some(amount) => amount,
        None => {
            reject(session, "amount is not a number");
            return Ok(());
        }
    };

    match session.ledger.transfer(&mut session.store, recipient, amount) {
        Ok(_) => (),
        Err(err) if err.is_invalid_input() => {
            reject(session, &err.to_string());
            return Ok(());
        },
        Err(err) => return Err(err.into())
    }
    render(&session.ledger, &mut session.document)?;
    return Ok(());
}

fn reject<S, D: Document>(session: &mut Session<S, D>, reason: &str) {
    warn!("rejected transfer: {}", reason);
    session.document.alert(INVALID_INPUT_MESSAGE);
}
