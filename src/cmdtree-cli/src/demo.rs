//! Command modules shipped with the binary.

use cmdtree_commands::{
    AssocArgs, AssocValue, CommandModule, DeferredModules, HandlerEntry, Implementation,
};

const QUERY_DOC: &str = "\
Run a SQL statement against the legacy database.

## OPTIONS

<sql>...
: Statement to run. Words are joined with spaces.

[--format=<format>]
: Output format.

@synopsis <sql>... [--format=<format>]
@alias db";

const ROCK_ON_DOC: &str = "\
Rock out with the configured volume.

## OPTIONS

[--volume=<number>]
: How loud to rock.

## EXAMPLES

    cmdtree music rock-on --volume=11

@synopsis [--volume=<number>]
@alias rock";

const PLAY_DOC: &str = "\
Play a song.

## OPTIONS

<song>
: Title of the song.

[--[no-]shuffle]
: Shuffle the queue afterwards.

@synopsis <song> [--[no-]shuffle]";

const SET_DOC: &str = "\
Store arbitrary settings.

## OPTIONS

--<field>=<value>
: Any number of key/value pairs.

@synopsis --<field>=<value>";

/// Helpers for the legacy SQL store.
pub struct LegacySql;

impl CommandModule for LegacySql {
    fn doc(&self) -> &str {
        "Talk to the legacy SQL store."
    }

    fn entries(&self) -> Vec<HandlerEntry> {
        vec![HandlerEntry::new("query", QUERY_DOC, |args: &[String], assoc: &AssocArgs| {
            let format = assoc
                .get("format")
                .and_then(AssocValue::as_str)
                .unwrap_or("table");
            println!("[{format}] {}", args.join(" "));
            0
        })]
    }
}

/// Music playback; registered lazily.
pub struct Music;

impl CommandModule for Music {
    fn doc(&self) -> &str {
        "Play music."
    }

    fn entries(&self) -> Vec<HandlerEntry> {
        vec![
            HandlerEntry::new("rock_on", ROCK_ON_DOC, |_: &[String], assoc: &AssocArgs| {
                let volume = assoc
                    .get("volume")
                    .and_then(AssocValue::as_str)
                    .unwrap_or("10");
                println!("Rocking at volume {volume}.");
                0
            }),
            HandlerEntry::new("play", PLAY_DOC, |args: &[String], assoc: &AssocArgs| {
                let shuffle = matches!(assoc.get("shuffle"), Some(AssocValue::Flag(true)));
                println!("Playing {}{}", args.join(" "), if shuffle { " (shuffle)" } else { "" });
                0
            })
            .with_prompt(true),
            HandlerEntry::new("stop_", "Stop playing.", |_: &[String], _: &AssocArgs| {
                println!("Stopped.");
                0
            }),
        ]
    }
}

/// Free-form settings.
pub struct Settings;

impl CommandModule for Settings {
    fn doc(&self) -> &str {
        "Manage settings."
    }

    fn entries(&self) -> Vec<HandlerEntry> {
        vec![HandlerEntry::new("set", SET_DOC, |_: &[String], assoc: &AssocArgs| {
            for (key, value) in assoc {
                println!("{key} = {value}");
            }
            0
        })]
    }
}

/// Modules registered up front, keyed by path.
pub fn eager_modules() -> Vec<(&'static [&'static str], Implementation)> {
    vec![
        (&["legacy-sql"][..], Implementation::module(LegacySql)),
        (&["config"][..], Implementation::module(Settings)),
    ]
}

/// Modules registered the first time their path is resolved.
pub fn deferred_modules() -> DeferredModules {
    let mut deferred = DeferredModules::new();
    deferred.defer(&["music"], || Implementation::module(Music));
    deferred
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdtree_commands::{CapturedOutput, CommandManager, DispatchConfig, DocBlock, synopsis};

    #[test]
    fn test_demo_synopses_parse_cleanly() {
        for doc in [QUERY_DOC, ROCK_ON_DOC, PLAY_DOC, SET_DOC] {
            let specs = synopsis::parse(DocBlock::parse(doc).synopsis());
            assert!(!specs.is_empty());
            assert!(specs.iter().all(|s| s.kind != cmdtree_commands::ArgKind::Unknown));
        }
    }

    #[test]
    fn test_music_is_loaded_on_demand() {
        let output = CapturedOutput::new();
        let mut manager = CommandManager::new(DispatchConfig::default())
            .with_output(output.clone())
            .with_loader(deferred_modules());
        for (path, implementation) in eager_modules() {
            manager.register(path, implementation).unwrap();
        }

        let root = manager.tree().root();
        assert!(manager.tree().lookup_child(root, "music").is_none());
        assert!(manager.resolve(vec!["music".into(), "rock".into()]).is_ok());
        assert!(manager.tree().lookup_child(root, "music").is_some());
        assert!(output.errors().is_empty());
    }
}
