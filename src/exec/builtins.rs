// src/exec/builtins.rs

//! Functions every build file can call without registering anything.
//!
//! Relative path arguments name files under the build root.

use std::fs::{self, OpenOptions};
use std::time::SystemTime;

use anyhow::{Context, Result, bail};

use super::function::{FunctionContext, FunctionRegistry};

pub fn register_all(registry: &mut FunctionRegistry) {
    registry
        .register("touch", touch)
        .register("mkdir", mkdir)
        .register("copy", copy)
        .register("remove", remove)
        .register("echo", echo);
}

/// Create each file if missing and set its modification time to now.
pub fn touch(cx: &FunctionContext, args: &[String]) -> Result<()> {
    if args.is_empty() {
        bail!("touch expects at least one path");
    }
    for path in args {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(cx.resolve(path))
            .with_context(|| format!("opening {path}"))?;
        file.set_modified(SystemTime::now())
            .with_context(|| format!("updating modification time of {path}"))?;
    }
    Ok(())
}

/// Create each directory, including missing parents.
pub fn mkdir(cx: &FunctionContext, args: &[String]) -> Result<()> {
    if args.is_empty() {
        bail!("mkdir expects at least one path");
    }
    for path in args {
        fs::create_dir_all(cx.resolve(path))
            .with_context(|| format!("creating directory {path}"))?;
    }
    Ok(())
}

/// `copy SOURCE DEST`
pub fn copy(cx: &FunctionContext, args: &[String]) -> Result<()> {
    let [source, dest] = args else {
        bail!("copy expects exactly two arguments (source, destination), got {}", args.len());
    };
    let dest_path = cx.resolve(dest);
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::copy(cx.resolve(source), &dest_path)
        .with_context(|| format!("copying {source} to {dest}"))?;
    Ok(())
}

/// Remove files or directory trees; paths that do not exist are ignored.
pub fn remove(cx: &FunctionContext, args: &[String]) -> Result<()> {
    for path in args {
        let path = cx.resolve(path);
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("removing {}", path.display()));
            }
        }
    }
    Ok(())
}

pub fn echo(_cx: &FunctionContext, args: &[String]) -> Result<()> {
    println!("{}", args.join(" "));
    Ok(())
}
