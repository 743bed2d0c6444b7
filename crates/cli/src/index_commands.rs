//! CLI commands over the plugin index.

use std::io::{self, Write};

use {
    clap::Subcommand,
    plugdex_index::{Index, Registration},
};

use crate::Commands;

#[derive(Subcommand)]
pub enum Lookup {
    /// Plugin that owns a command.
    Command { name: String },
    /// Plugin that owns a source handler.
    Source { name: String },
}

pub fn handle(index: Index, command: Commands) -> anyhow::Result<()> {
    let stdout = io::stdout();
    run(index, command, &mut stdout.lock())
}

fn run(mut index: Index, command: Commands, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::Register {
            name,
            path,
            load_paths,
            commands,
            sources,
            hooks,
        } => {
            let registration = Registration::new(&name, path)
                .load_paths(load_paths)
                .commands(commands)
                .sources(sources)
                .hooks(hooks);
            index.register_plugin(registration)?;
            writeln!(out, "Registered {name}.")?;
        },
        Commands::Unregister { name } => {
            if index.unregister_plugin(&name)? {
                writeln!(out, "Unregistered {name}.")?;
            } else {
                writeln!(out, "Plugin '{name}' is not installed.")?;
            }
        },
        Commands::List { json } => {
            if json {
                let entries: Vec<serde_json::Value> = index
                    .installed_plugins()
                    .into_iter()
                    .filter_map(|name| index.record(name))
                    .map(|record| {
                        serde_json::json!({
                            "name": record.name,
                            "path": record.path,
                            "load_paths": record.load_paths,
                            "commands": index.plugin_commands(&record.name),
                            "sources": index.plugin_sources(&record.name),
                            "hooks": index.plugin_hooks(&record.name),
                        })
                    })
                    .collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            } else if index.installed_plugins().is_empty() {
                writeln!(out, "No plugins installed.")?;
                writeln!(out, "Index file: {}", index.index_file().display())?;
            } else {
                for name in index.installed_plugins() {
                    let path = index
                        .plugin_path(name)
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    writeln!(out, "  {name} — {path}")?;
                }
            }
        },
        Commands::Info { name } => {
            let Some(record) = index.record(&name) else {
                anyhow::bail!("plugin '{name}' is not installed");
            };
            writeln!(out, "Name:        {}", record.name)?;
            writeln!(out, "Path:        {}", record.path.display())?;
            writeln!(out, "Load paths:  {}", record.load_paths.join(", "))?;
            writeln!(
                out,
                "Commands:    {}",
                index.plugin_commands(&name).join(", ")
            )?;
            writeln!(out, "Sources:     {}", index.plugin_sources(&name).join(", "))?;
            writeln!(out, "Hooks:       {}", index.plugin_hooks(&name).join(", "))?;
        },
        Commands::Which { lookup } => {
            let (kind, key, owner) = match lookup {
                Lookup::Command { ref name } => ("command", name, index.command_plugin(name)),
                Lookup::Source { ref name } => ("source", name, index.source_plugin(name)),
            };
            match owner {
                Some(plugin) => writeln!(out, "{plugin}")?,
                None => anyhow::bail!("no plugin provides {kind} '{key}'"),
            }
        },
        Commands::Hooks { event } => {
            for plugin in index.hook_plugins(&event) {
                writeln!(out, "{plugin}")?;
            }
        },
    }
    Ok(())
}
