//! Site-configuration evaluator: the data model of structure trees, the
//! compilation of declarative options into callable components, and the
//! Command Planner that walks the tree against each fetched response.
//!
//! [`config`] builds and loads [`config::SiteConfig`], [`tree`] holds the
//! compiled [`tree::StructureTree`], [`planner::plan`] is the traversal
//! entry point, and [`simulator::simulate`] is its dry-run counterpart used
//! by a debug flow to disambiguate which structure path a URL would hit.

mod command;
mod component;
mod config;
mod error;
mod paths;
mod planner;
mod response;
mod schema;
mod simulator;
mod tree;

pub use command::{Command, UrlInfo};
pub use component::{ParamKit, PreReqArgs, Source, UrlMatch};
pub use config::{
    load_yaml, node, LoginConfig, LoginConfigYaml, SiteConfig, SiteConfigDefinition,
    SiteConfigFile,
};
pub use error::{CoreError, Result};
pub use planner::plan;
pub use response::PlannerResponse;
pub use schema::{
    Assertion, ContentSelector, FileContentExtractor, FileContentValue, FilePathExtractor,
    ParamKitOwned, PreReqArgsOwned, UrlConverter, UrlMatcher,
};
pub use simulator::{simulate, SimulatedHit};
pub use tree::{build, NodeDef, StructureDefItem, StructureNode, StructureTree};
