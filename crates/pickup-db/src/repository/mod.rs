//! # Repository Module
//!
//! PostgreSQL statements, one module per table.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where SQL Lives                                      │
//! │                                                                         │
//! │  LifecycleOrchestrator                                                 │
//! │       │  gateway.get_active_reception(&mut tx, point_id)               │
//! │       ▼                                                                 │
//! │  Database (impl StorageGateway)                                        │
//! │       │  reception::find_active(&mut **tx, point_id)                   │
//! │       ▼                                                                 │
//! │  repository::reception                                                 │
//! │  ├── find_active(conn, point_id)     SELECT … FOR UPDATE               │
//! │  ├── close_active(conn, point_id)    UPDATE … RETURNING                │
//! │  ├── insert(conn, point_id)                                            │
//! │  └── list_in_window(conn, …, lock)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function takes a `&mut PgConnection`, so the caller decides whether
//! it runs inside a transaction or on a pooled connection.

pub mod point;
pub mod product;
pub mod reception;
