// src/config/validate.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::model::{ArgList, MergedBuildFile, OneOrMany, RawJobSpec, RawTaskSpec};
use crate::config::strings::Substitution;
use crate::errors::{BuildError, Result};
use crate::job::{BuildSpec, Job, JobDescriptor, ShellJob, TaskSequence, Work};

/// Turn merged build files into a validated [`BuildSpec`].
///
/// `defines` take precedence over the files' `strings`.
pub fn into_build_spec(
    merged: MergedBuildFile,
    defines: &BTreeMap<String, String>,
) -> Result<BuildSpec> {
    let mut values = merged.strings;
    values.extend(defines.iter().map(|(k, v)| (k.clone(), v.clone())));
    let subst = Substitution::new(values)?;

    let descriptors = merged
        .jobs
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            descriptor_from_raw(raw, &subst).map_err(|e| match e {
                BuildError::ConfigError(msg) => {
                    BuildError::ConfigError(format!("job #{}: {msg}", i + 1))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let stage_order = subst.apply_all(merged.stages)?;
    BuildSpec::new(descriptors, stage_order)
}

fn descriptor_from_raw(raw: RawJobSpec, subst: &Substitution) -> Result<JobDescriptor> {
    let work = match (raw.job, raw.cmd, raw.tasks) {
        (Some(name), None, None) => {
            ensure_no_shell_options(raw.dir.is_some(), raw.display_output, raw.ignore_failure)?;
            Work::Single(function_job(&name, raw.args, subst)?)
        }
        (None, Some(cmd), None) => Work::Single(shell_job(
            cmd,
            raw.args,
            raw.dir,
            raw.display_output,
            raw.ignore_failure,
            subst,
        )?),
        (None, None, Some(tasks)) => {
            if raw.args.is_some() || raw.dir.is_some() {
                return config_err("`args` and `dir` belong on the members of `tasks`");
            }
            if tasks.is_empty() {
                return config_err("`tasks` must contain at least one job");
            }
            let jobs = tasks
                .into_iter()
                .map(|t| task_job(t, raw.display_output, raw.ignore_failure, subst))
                .collect::<Result<Vec<_>>>()?;
            Work::Sequence(TaskSequence { jobs })
        }
        (None, None, None) => return config_err("one of `job`, `cmd` or `tasks` is required"),
        _ => return config_err("only one of `job`, `cmd` or `tasks` may be given"),
    };

    // A single string may list several dependencies separated by whitespace.
    let dependencies = raw
        .dependency
        .map(|deps| match deps {
            OneOrMany::One(line) => line.split_whitespace().map(str::to_string).collect(),
            OneOrMany::Many(list) => list,
        })
        .map(|deps| subst.apply_all(deps))
        .transpose()?;

    match (raw.target, raw.stage) {
        (Some(_), Some(_)) => config_err("`stage` cannot be combined with `target`"),
        (Some(target), None) => Ok(JobDescriptor::target(
            work,
            subst.apply(&target)?,
            dependencies.unwrap_or_default(),
        )),
        (None, stage) => {
            if dependencies.is_some() {
                return config_err("`dependency` requires a `target`");
            }
            let stage = stage.map(|s| subst.apply(&s)).transpose()?;
            Ok(JobDescriptor::stage(work, stage))
        }
    }
}

fn task_job(
    task: RawTaskSpec,
    display_output: bool,
    ignore_failure: bool,
    subst: &Substitution,
) -> Result<Job> {
    match (task.job, task.cmd) {
        (Some(name), None) => {
            ensure_no_shell_options(task.dir.is_some(), task.display_output, task.ignore_failure)?;
            function_job(&name, task.args, subst)
        }
        (None, Some(cmd)) => shell_job(
            cmd,
            task.args,
            task.dir,
            task.display_output || display_output,
            task.ignore_failure || ignore_failure,
            subst,
        ),
        (None, None) => config_err("each member of `tasks` needs `job` or `cmd`"),
        (Some(_), Some(_)) => config_err("a member of `tasks` cannot have both `job` and `cmd`"),
    }
}

fn function_job(name: &str, args: Option<ArgList>, subst: &Substitution) -> Result<Job> {
    let args = subst.apply_all(args.map(ArgList::into_args).unwrap_or_default())?;
    Ok(Job::function(subst.apply(name)?, args))
}

fn shell_job(
    cmd: ArgList,
    args: Option<ArgList>,
    dir: Option<OneOrMany<String>>,
    display_output: bool,
    ignore_failure: bool,
    subst: &Substitution,
) -> Result<Job> {
    let mut words = subst.apply_all(cmd.into_args())?.into_iter();
    let Some(program) = words.next() else {
        return config_err("`cmd` is empty");
    };
    let mut all_args: Vec<String> = words.collect();
    all_args.extend(subst.apply_all(args.map(ArgList::into_args).unwrap_or_default())?);

    let working_dir = dir
        .map(|d| {
            subst
                .apply_all(d.into_vec())
                .map(|segments| segments.into_iter().collect::<PathBuf>())
        })
        .transpose()?;

    Ok(Job::Shell(ShellJob {
        program,
        args: all_args,
        working_dir,
        display_output,
        ignore_failure,
    }))
}

fn ensure_no_shell_options(has_dir: bool, display_output: bool, ignore_failure: bool) -> Result<()> {
    if has_dir || display_output || ignore_failure {
        return config_err("`dir`, `display_output` and `ignore_failure` only apply to `cmd` jobs");
    }
    Ok(())
}

fn config_err<T>(msg: &str) -> Result<T> {
    Err(BuildError::ConfigError(msg.to_string()))
}
