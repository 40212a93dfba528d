//! CLI Tooling
//!
//! Command-line interface over the tree cache: browse projects, soft delete
//! and restore nodes, import node sets and repair document counters.

use crate::config::{ConfigLoader, DoctreeConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::node::Node;
use crate::project::ProjectRepository;
use crate::tooling::format::{
    format_deleted_table, format_id_list, format_node_table, format_project_text,
    format_tree_text,
};
use crate::tree::TreeCache;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Doctree CLI - local cache of project document trees
#[derive(Parser)]
#[command(name = "doctree")]
#[command(about = "Browse and maintain the local project document tree cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List nodes, for one project or the whole store
    List {
        /// Only live nodes of this project
        #[arg(long)]
        project: Option<String>,
        /// Include soft-deleted nodes (whole-store listing only)
        #[arg(long)]
        include_deleted: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show a project's live nodes as a tree
    Tree {
        project: String,
        /// Folders only
        #[arg(long)]
        folders: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print one node as JSON
    Show {
        id: String,
        /// Show the node even if it is soft-deleted
        #[arg(long)]
        include_deleted: bool,
    },
    /// List a project's soft-deleted nodes, most recent first
    Deleted {
        project: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Soft-delete a node
    Delete {
        id: String,
        /// Also delete every node below it
        #[arg(long)]
        subtree: bool,
    },
    /// Restore a node, its deleted ancestors and, for folders, its subtree
    Restore { id: String },
    /// Import a JSON array of nodes into a project under fresh ids
    Import {
        project: String,
        /// File holding the nodes
        file: PathBuf,
        /// replace: soft-delete the project's nodes first; append: merge
        #[arg(long, value_enum, default_value = "append")]
        mode: ImportMode,
    },
    /// Recount a project's documents
    Refresh { project: String },
    /// Show a project aggregate
    Project {
        project: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportMode {
    Replace,
    Append,
}

impl Cli {
    /// Logging config with command-line overrides applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

/// Load layered configuration, honoring `--config`
pub fn load_config(config_path: Option<&Path>) -> Result<DoctreeConfig, ApiError> {
    ConfigLoader::load_for_cli(config_path)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn read_import_file(path: &Path) -> Result<Vec<Node>, ApiError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ApiError::ImportError(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| ApiError::ImportError(format!("{}: {}", path.display(), e)))
}

/// CLI context owning the tree cache
pub struct CliContext {
    cache: TreeCache,
}

impl CliContext {
    pub async fn new(config: &DoctreeConfig) -> Result<Self, ApiError> {
        Ok(Self {
            cache: TreeCache::from_config(config).await?,
        })
    }

    pub fn with_cache(cache: TreeCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Execute a CLI command, returning its output
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        // Surface an unavailable store before any command degrades quietly.
        self.cache.store().await?;

        match command {
            Commands::List {
                project,
                include_deleted,
                format,
            } => {
                let nodes = match project {
                    Some(project) => self.cache.get_by_project(project).await,
                    None => self.cache.get_all(*include_deleted).await,
                };
                if format == "json" {
                    return to_json(&nodes);
                }
                Ok(format_node_table(&nodes))
            }
            Commands::Tree {
                project,
                folders,
                format,
            } => {
                let items = if *folders {
                    self.cache.get_folder_tree(project).await
                } else {
                    self.cache.get_tree(project).await
                };
                if format == "json" {
                    return to_json(&items);
                }
                Ok(format_tree_text(project, &items))
            }
            Commands::Show {
                id,
                include_deleted,
            } => match self.cache.get_by_id(id, *include_deleted).await {
                Some(node) => to_json(&node),
                None => Err(ApiError::NodeNotFound(id.clone())),
            },
            Commands::Deleted { project, format } => {
                let nodes = self.cache.list_deleted(project).await;
                if format == "json" {
                    return to_json(&nodes);
                }
                Ok(format_deleted_table(project, &nodes))
            }
            Commands::Delete { id, subtree } => {
                if *subtree {
                    let deleted = self.cache.delete_subtree(id).await;
                    if deleted.is_empty() {
                        return Err(ApiError::NodeNotFound(id.clone()));
                    }
                    Ok(format_id_list("Deleted", &deleted))
                } else if self.cache.soft_delete(id).await {
                    Ok(format_id_list("Deleted", std::slice::from_ref(id)))
                } else {
                    Err(ApiError::NodeNotFound(id.clone()))
                }
            }
            Commands::Restore { id } => {
                let restored = self.cache.restore(id).await;
                if restored.is_empty() {
                    return Ok(format!("Nothing to restore for {}", id));
                }
                Ok(format_id_list("Restored", &restored))
            }
            Commands::Import {
                project,
                file,
                mode,
            } => {
                let nodes = read_import_file(file)?;
                let requested = nodes.len();
                info!(project_id = %project, requested, mode = ?mode, "Importing nodes");
                match mode {
                    ImportMode::Replace => {
                        if !self.cache.replace_all(nodes, project).await {
                            return Err(ApiError::OperationFailed(format!(
                                "replace import into {}",
                                project
                            )));
                        }
                        Ok(format!("Replaced {} with {} nodes", project, requested))
                    }
                    ImportMode::Append => {
                        let ids = self.cache.append(nodes, project).await;
                        Ok(format_id_list(
                            &format!("Imported {}/{}:", ids.len(), requested),
                            &ids,
                        ))
                    }
                }
            }
            Commands::Refresh { project } => match self.cache.refresh(project).await {
                Some(doc_num) => Ok(format!("{}: {} documents", project, doc_num)),
                None => Err(ApiError::OperationFailed(format!(
                    "could not refresh document count for {}",
                    project
                ))),
            },
            Commands::Project { project, format } => {
                let aggregate = self
                    .cache
                    .projects()
                    .get(project)
                    .await?
                    .ok_or_else(|| ApiError::ProjectNotFound(project.clone()))?;
                if format == "json" {
                    return to_json(&aggregate);
                }
                Ok(format_project_text(&aggregate))
            }
        }
    }
}
