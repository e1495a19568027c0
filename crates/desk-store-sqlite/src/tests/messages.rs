use desk_core::{
  message::{AuthorType, NewMessage},
  store::{MessageStore, TicketStore},
  ticket::NewTicket,
};
use uuid::Uuid;

use super::store;

#[tokio::test]
async fn thread_is_oldest_first() {
  let s = store().await;
  let customer = Uuid::new_v4();
  let admin = Uuid::new_v4();
  let ticket = s
    .create_ticket(NewTicket::new(customer, "Login issue", "Technical"))
    .await
    .unwrap();

  for content in ["one", "two", "three"] {
    s.create_message(NewMessage::from_customer(ticket.ticket_id, customer, content))
      .await
      .unwrap();
  }
  s.create_message(NewMessage::from_admin(ticket.ticket_id, admin, "four", false))
    .await
    .unwrap();

  let thread = s.list_messages(ticket.ticket_id, true).await.unwrap();
  let contents: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
  assert_eq!(contents, ["one", "two", "three", "four"]);
  assert_eq!(thread[3].author_type, AuthorType::Admin);
  assert_eq!(thread[3].author_id, admin);
}

#[tokio::test]
async fn internal_notes_excluded_from_public_thread() {
  let s = store().await;
  let customer = Uuid::new_v4();
  let admin = Uuid::new_v4();
  let ticket = s
    .create_ticket(NewTicket::new(customer, "Refund", "Billing"))
    .await
    .unwrap();

  s.create_message(NewMessage::from_customer(ticket.ticket_id, customer, "Please refund"))
    .await
    .unwrap();
  let note = s
    .create_message(NewMessage::from_admin(
      ticket.ticket_id,
      admin,
      "Customer is on a legacy plan",
      true,
    ))
    .await
    .unwrap();
  s.create_message(NewMessage::from_admin(ticket.ticket_id, admin, "Refund issued", false))
    .await
    .unwrap();

  let public = s.list_messages(ticket.ticket_id, false).await.unwrap();
  assert_eq!(public.len(), 2);
  assert!(public.iter().all(|m| !m.is_internal));
  assert!(public.iter().all(|m| m.message_id != note.message_id));

  let full = s.list_messages(ticket.ticket_id, true).await.unwrap();
  assert_eq!(full.len(), 3);
  assert!(full[1].is_internal);
}

#[tokio::test]
async fn threads_are_per_ticket() {
  let s = store().await;
  let customer = Uuid::new_v4();
  let a = s
    .create_ticket(NewTicket::new(customer, "A", "General"))
    .await
    .unwrap();
  let b = s
    .create_ticket(NewTicket::new(customer, "B", "General"))
    .await
    .unwrap();

  s.create_message(NewMessage::from_customer(a.ticket_id, customer, "for a"))
    .await
    .unwrap();

  assert_eq!(s.list_messages(a.ticket_id, true).await.unwrap().len(), 1);
  assert!(s.list_messages(b.ticket_id, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn message_for_unknown_ticket_is_rejected() {
  let s = store().await;
  let err = s
    .create_message(NewMessage::from_customer(Uuid::new_v4(), Uuid::new_v4(), "hello"))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
}
