//! Shared test utilities for integration tests
//!
//! Fixture trees, a recording UI collaborator and the default
//! configuration pointed at a fixture.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use assert_fs::prelude::*;
use phpcloak::core::pipeline::ObfuscatorUi;
use phpcloak::infra::config::Config;

/// `"F" + md5("foo")`
pub const FOO: &str = "FACBD18DB4CC2F85CEDEF654FCCC4A4D8";
/// `"F" + md5("helper")`
pub const HELPER: &str = "FFDE5D67BFB6DC4B598291CC2CE35EE4A";
/// `"C" + md5("Base")`
pub const BASE: &str = "C095A1B43EFFEC73955E31E790438DE49";
/// `"C" + md5("Child")`
pub const CHILD: &str = "CA82FEA383F121C803741F8DE1C209734";
/// `"$R" + md5("$c")`
pub const VAR_C: &str = "$R3E33E017CD76B9B7E6C7364FB91E2E90";
/// `"$R" + md5("$x")`
pub const VAR_X: &str = "$R8725029EA89712EED8670BAE64D30E47";
/// `"$R" + md5("$a")`
pub const VAR_A: &str = "$R52D5B5E885B21331CFD2304BE571DE0B";
/// `"$R" + md5("$total")`
pub const VAR_TOTAL: &str = "$RFF073106DF53C7C31BC2E1F5598ABC67";

pub const BANNER: &str = "<?php /* This file encoded by phpcloak */ ?>\n";

/// Temp dir with `files` written under `src/`.
pub fn make_fixture(files: &[(&str, &str)]) -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    for (path, body) in files
    {
        tmp.child(format!("src/{path}"))
            .write_str(body)
            .expect("write fixture");
    }

    tmp
}

/// Defaults with `src/` as source and `out/` as target.
pub fn config_for(tmp: &assert_fs::TempDir) -> Config
{
    Config {
        source_dir: tmp.path().join("src"),
        target_dir: tmp.path().join("out"),
        ..Config::default()
    }
}

pub fn read_out(
    tmp: &assert_fs::TempDir,
    rel: &str,
) -> String
{
    std::fs::read_to_string(tmp.path().join("out").join(rel)).expect("read output")
}

/// Everything the pipeline reported. Clones share one log, so a clone can
/// be handed to a background worker and inspected afterwards.
#[derive(Clone, Default)]
pub struct Recorder
{
    pub log: Arc<Mutex<Events>>,
}

#[derive(Debug, Default)]
pub struct Events
{
    pub statuses: Vec<String>,
    pub errors: Vec<String>,
    pub done: usize,
}

impl Recorder
{
    pub fn statuses(&self) -> Vec<String>
    {
        self.log.lock().unwrap().statuses.clone()
    }

    pub fn errors(&self) -> Vec<String>
    {
        self.log.lock().unwrap().errors.clone()
    }

    pub fn done_count(&self) -> usize
    {
        self.log.lock().unwrap().done
    }
}

impl ObfuscatorUi for Recorder
{
    fn status_update(
        &mut self,
        message: &str,
    )
    {
        self.log.lock().unwrap().statuses.push(message.to_string());
    }

    fn error(
        &mut self,
        message: &str,
    )
    {
        self.log.lock().unwrap().errors.push(message.to_string());
    }

    fn done(&mut self)
    {
        self.log.lock().unwrap().done += 1;
    }
}
