// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use resflat_archive::create_archive_writer;
use resflat_common::{Diagnostics, StderrDiagnostics};
use resflat_compiler::{compile_inputs, extract_resource_path_data, CompileOptions};

mod res_dir;

/// Compile individual resource files or a whole res/ tree into intermediate
/// `.flat` artifacts.
///
/// ```
/// $ resflat -o compiled.zip --dir ./res
/// $ resflat -o ./out res/values/strings.xml res/layout/main.xml
/// ```
///
/// An output path ending in `.zip` produces a zip archive; anything else is
/// treated as a directory with one file per artifact.
#[derive(Parser)]
#[command(name = "resflat", about = "Compiles resources into intermediate artifacts")]
struct Args {
    /// Output archive (zip) or directory path
    #[arg(short = 'o', value_name = "PATH")]
    output: PathBuf,

    /// Directory to scan for resources
    #[arg(long = "dir", value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Generate resources for pseudo-locales (en-XA and ar-XB)
    #[arg(long = "pseudo-localize")]
    pseudo_localize: bool,

    /// Treat errors that used to be valid in legacy compilers as warnings
    #[arg(long)]
    legacy: bool,

    /// Enables verbose logging
    #[arg(short = 'v')]
    verbose: bool,

    /// Explicit input files; mutually exclusive with --dir
    files: Vec<String>
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage problems print the synopsis to stderr and fail.
            eprint!("{}", err.render());
            return ExitCode::FAILURE;
        }
    };

    let diag = StderrDiagnostics {
        verbose: args.verbose
    };

    // Collect and classify every input before anything is compiled or the
    // output is even created; a bad path fails the batch up front.
    let inputs = if let Some(res_dir) = &args.dir {
        if !args.files.is_empty() {
            diag.error(None, "files given but --dir specified");
            eprint!("{}", Args::command().render_help());
            return ExitCode::FAILURE;
        }
        match res_dir::load_inputs_from_dir(res_dir) {
            Ok(inputs) => inputs,
            Err(err) => {
                diag.error(None, &err.to_string());
                return ExitCode::FAILURE;
            }
        }
    } else {
        let mut inputs = Vec::with_capacity(args.files.len());
        let mut failed = false;
        for file in &args.files {
            match extract_resource_path_data(file) {
                Ok(data) => inputs.push(data),
                Err(err) => {
                    diag.error(None, &err.to_string());
                    failed = true;
                }
            }
        }
        if failed {
            return ExitCode::FAILURE;
        }
        inputs
    };

    let mut writer = match create_archive_writer(&args.output) {
        Ok(writer) => writer,
        Err(err) => {
            diag.error(Some(&args.output.to_string_lossy()), &err.to_string());
            return ExitCode::FAILURE;
        }
    };

    let options = CompileOptions {
        pseudolocalize: args.pseudo_localize,
        legacy_mode: args.legacy,
        verbose: args.verbose
    };

    let ok = compile_inputs(&inputs, &options, writer.as_mut(), &diag);

    if let Err(err) = writer.finish() {
        diag.error(Some(&args.output.to_string_lossy()), &err.to_string());
        return ExitCode::FAILURE;
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
