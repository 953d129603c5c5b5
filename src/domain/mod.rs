//! Sales domain: value objects, option schemas, aggregates, events and services
pub mod aggregates;
pub mod events;
pub mod options;
pub mod services;
pub mod value_objects;
