//! [`TicketService`], the single entry point for ticket business rules.
//!
//! Handlers never write to the stores directly. The service validates input,
//! performs the writes, and calls the [`Notifier`] for customer-visible
//! replies. Ticket and message writes are separate statements; nothing spans
//! them.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  message::{Audience, Message, NewMessage},
  notify::{NotificationOutcome, Notifier},
  store::{MessageStore, TicketQuery, TicketStore},
  ticket::{NewTicket, Ticket, TicketPatch, TicketPriority, TicketStatus},
};

/// The result of [`TicketService::add_admin_reply`].
#[derive(Debug, Clone, Serialize)]
pub struct ReplyOutcome {
  pub message:      Message,
  pub notification: NotificationOutcome,
}

/// A ticket together with the part of its thread the reader may see.
#[derive(Debug, Clone, Serialize)]
pub struct TicketThread {
  pub ticket:   Ticket,
  pub messages: Vec<Message>,
}

/// One page of a ticket listing.
#[derive(Debug, Clone, Serialize)]
pub struct TicketPage {
  pub tickets: Vec<Ticket>,
  pub total:   u64,
  pub limit:   usize,
  pub offset:  usize,
}

pub struct TicketService<S, N> {
  store:    S,
  notifier: N,
}

impl<S, N> TicketService<S, N>
where
  S: TicketStore + MessageStore,
  N: Notifier,
{
  pub fn new(store: S, notifier: N) -> Self { Self { store, notifier } }

  pub fn store(&self) -> &S { &self.store }

  // ── Creation ──────────────────────────────────────────────────────────────

  /// Validate and persist a new `OPEN` ticket. An opening message, if any,
  /// is written afterwards as the first customer message.
  pub async fn create_ticket(&self, data: NewTicket) -> Result<Ticket> {
    let data = data.validated()?;
    let opening = data.message.clone();

    let ticket = self
      .store
      .create_ticket(data)
      .await
      .map_err(persistence)?;

    if let Some(content) = opening {
      self
        .store
        .create_message(NewMessage::from_customer(
          ticket.ticket_id,
          ticket.customer_id,
          content,
        ))
        .await
        .map_err(persistence)?;
    }

    info!(
      ticket_id = %ticket.ticket_id,
      customer_id = %ticket.customer_id,
      priority = %ticket.priority,
      "ticket created"
    );
    Ok(ticket)
  }

  // ── Replies ───────────────────────────────────────────────────────────────

  /// Append a staff message. Customer-visible replies notify the customer;
  /// a failed notification does not undo the write.
  pub async fn add_admin_reply(
    &self,
    ticket_id: Uuid,
    author_id: Uuid,
    content: &str,
    is_internal: bool,
  ) -> Result<ReplyOutcome> {
    let content = required_content(content)?;
    let ticket = self.require_ticket(ticket_id).await?;

    if !is_internal && ticket.is_closed() {
      return Err(Error::TicketClosed(ticket_id));
    }

    let message = self
      .store
      .create_message(NewMessage::from_admin(
        ticket_id,
        author_id,
        content,
        is_internal,
      ))
      .await
      .map_err(persistence)?;
    self.touch(ticket_id).await?;

    let notification = if is_internal {
      NotificationOutcome::Skipped
    } else {
      match self
        .notifier
        .notify(ticket.customer_id, ticket_id, &message.content)
        .await
      {
        Ok(()) => NotificationOutcome::Sent,
        Err(e) => {
          warn!(%ticket_id, customer_id = %ticket.customer_id, error = %e, "reply notification failed");
          NotificationOutcome::Failed(e.to_string())
        }
      }
    };

    info!(%ticket_id, %author_id, is_internal, "admin reply added");
    Ok(ReplyOutcome { message, notification })
  }

  /// Append a message from the ticket's owner. Tickets owned by someone else
  /// are reported as not found.
  pub async fn add_customer_reply(
    &self,
    ticket_id: Uuid,
    customer_id: Uuid,
    content: &str,
  ) -> Result<Message> {
    let content = required_content(content)?;
    let ticket = self.get_ticket_for_customer(ticket_id, customer_id).await?;

    if ticket.is_closed() {
      return Err(Error::TicketClosed(ticket_id));
    }

    let message = self
      .store
      .create_message(NewMessage::from_customer(ticket_id, customer_id, content))
      .await
      .map_err(persistence)?;
    self.touch(ticket_id).await?;

    info!(%ticket_id, %customer_id, "customer reply added");
    Ok(message)
  }

  // ── State changes ─────────────────────────────────────────────────────────

  /// Set the status from its wire form. Unknown values are rejected before
  /// anything is written.
  pub async fn update_ticket_status(
    &self,
    ticket_id: Uuid,
    new_status: &str,
  ) -> Result<Ticket> {
    let status = TicketStatus::parse(new_status)?;
    let ticket = self.apply(ticket_id, TicketPatch::status(status)).await?;
    info!(%ticket_id, %status, "ticket status updated");
    Ok(ticket)
  }

  pub async fn update_ticket_priority(
    &self,
    ticket_id: Uuid,
    new_priority: &str,
  ) -> Result<Ticket> {
    let priority = TicketPriority::parse(new_priority)?;
    let ticket = self.apply(ticket_id, TicketPatch::priority(priority)).await?;
    info!(%ticket_id, %priority, "ticket priority updated");
    Ok(ticket)
  }

  /// Set or clear (`None`) the assignee.
  pub async fn assign_ticket(
    &self,
    ticket_id: Uuid,
    assignee_id: Option<Uuid>,
  ) -> Result<Ticket> {
    let ticket = self.apply(ticket_id, TicketPatch::assignee(assignee_id)).await?;
    match assignee_id {
      Some(assignee) => info!(%ticket_id, %assignee, "ticket assigned"),
      None => info!(%ticket_id, "ticket unassigned"),
    }
    Ok(ticket)
  }

  pub async fn is_ticket_closed(&self, ticket_id: Uuid) -> Result<bool> {
    Ok(self.require_ticket(ticket_id).await?.is_closed())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get_ticket(&self, ticket_id: Uuid) -> Result<Ticket> {
    self.require_ticket(ticket_id).await
  }

  pub async fn get_ticket_for_customer(
    &self,
    ticket_id: Uuid,
    customer_id: Uuid,
  ) -> Result<Ticket> {
    let ticket = self.require_ticket(ticket_id).await?;
    if ticket.customer_id != customer_id {
      return Err(Error::TicketNotFound(ticket_id));
    }
    Ok(ticket)
  }

  /// The ticket plus every message `audience` is allowed to read.
  pub async fn thread(
    &self,
    ticket_id: Uuid,
    audience: Audience,
  ) -> Result<TicketThread> {
    let ticket = match audience {
      Audience::Staff => self.require_ticket(ticket_id).await?,
      Audience::Customer(customer_id) => {
        self.get_ticket_for_customer(ticket_id, customer_id).await?
      }
    };
    let messages = self
      .store
      .list_messages(ticket_id, audience.includes_internal())
      .await
      .map_err(persistence)?;
    Ok(TicketThread { ticket, messages })
  }

  pub async fn list_tickets(&self, query: &TicketQuery) -> Result<TicketPage> {
    let tickets = self.store.list_tickets(query).await.map_err(persistence)?;
    let total = self.store.count_tickets(query).await.map_err(persistence)?;
    Ok(TicketPage {
      tickets,
      total,
      limit: query.limit(),
      offset: query.offset(),
    })
  }

  /// Like [`Self::list_tickets`] but always scoped to one customer.
  pub async fn list_customer_tickets(
    &self,
    customer_id: Uuid,
    mut query: TicketQuery,
  ) -> Result<TicketPage> {
    query.customer_id = Some(customer_id);
    query.assignee_id = None;
    self.list_tickets(&query).await
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn require_ticket(&self, ticket_id: Uuid) -> Result<Ticket> {
    self
      .store
      .get_ticket(ticket_id)
      .await
      .map_err(persistence)?
      .ok_or(Error::TicketNotFound(ticket_id))
  }

  async fn touch(&self, ticket_id: Uuid) -> Result<()> {
    self
      .store
      .update_ticket(ticket_id, TicketPatch::touch())
      .await
      .map_err(persistence)?;
    Ok(())
  }

  async fn apply(&self, ticket_id: Uuid, patch: TicketPatch) -> Result<Ticket> {
    let found = self
      .store
      .update_ticket(ticket_id, patch)
      .await
      .map_err(persistence)?;
    if !found {
      return Err(Error::TicketNotFound(ticket_id));
    }
    self.require_ticket(ticket_id).await
  }
}

fn required_content(content: &str) -> Result<&str> {
  let content = content.trim();
  if content.is_empty() {
    return Err(Error::validation("message content is required"));
  }
  Ok(content)
}

/// Log a backend failure and wrap it.
pub(crate) fn persistence<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  tracing::error!(error = %e, "store operation failed");
  Error::persistence(e)
}
