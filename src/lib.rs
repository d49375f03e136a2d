//! mailboard: a dashboard client for a spreadsheet-backed email gateway.
//!
//! Polls the gateway for statistics and the email log, renders them to a
//! local web page or the terminal, and sends follow-up or manual emails
//! through the same endpoint.

pub mod activity;
pub mod cli;
pub mod composer;
pub mod config;
pub mod gateway;
pub mod model;
pub mod notify;
pub mod poller;
pub mod render;
pub mod status;
pub mod timer;
pub mod view;
pub mod web;
