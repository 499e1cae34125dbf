use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;
use tsify::Tsify;
use wasm_bindgen::prelude::*;

use cai_emulator::{
    compiler::{load, DebugInfo},
    constants::{LineNumber, Word},
    parser::{line::LineContent, parse, Source},
};

#[wasm_bindgen(start)]
fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

/// Render an error along with its sources
fn error_message(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(error) = source {
        message.push_str(": ");
        message.push_str(&error.to_string());
        source = error.source();
    }
    message
}

/// Names of the labels defined in a source, each listed once
fn label_names(source: &Source<'_>) -> Vec<String> {
    source
        .lines
        .iter()
        .filter_map(|line| match line.inner {
            LineContent::Label(label) => Some(label),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn to_js(error: &dyn std::error::Error) -> JsValue {
    error_message(error).into()
}

#[wasm_bindgen]
pub struct Program {
    source: String,
    labels: Vec<String>,
}

#[wasm_bindgen]
impl Program {
    #[wasm_bindgen]
    pub fn parse(source: String) -> Result<Program, JsValue> {
        let parsed = parse(&source).map_err(|e| to_js(&e))?;
        let labels = label_names(&parsed);

        Ok(Self { source, labels })
    }

    #[wasm_bindgen(getter)]
    pub fn source(&self) -> String {
        self.source.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn labels(&self) -> Labels {
        Labels(self.labels.clone())
    }

    #[wasm_bindgen]
    pub fn compile(&self) -> Result<Computer, JsValue> {
        let (computer, debug_info) = load(&self.source).map_err(|e| to_js(&e))?;

        Ok(Computer {
            debug_info,
            computer,
        })
    }
}

#[derive(Serialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Labels(Vec<String>);

#[wasm_bindgen]
pub struct Computer {
    debug_info: DebugInfo,
    computer: cai_emulator::runtime::Computer,
}

#[derive(Serialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct State {
    accumulator: Word,
    pc: LineNumber,
    flags: String,
    ended: bool,
    steps: u64,
}

#[derive(Serialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Output(Vec<Word>);

#[derive(Serialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct MemoryView {
    start: usize,
    end: usize,
    cells: Vec<Word>,
}

#[derive(Serialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct LabelsWithLines(BTreeMap<String, LineNumber>);

#[wasm_bindgen]
impl Computer {
    /// Execute one instruction, returns true once the program has ended
    pub fn step(&mut self) -> Result<bool, JsValue> {
        self.computer.step().map_err(|e| to_js(&e))?;
        let ended = self.computer.registers.has_ended();
        if ended {
            debug!(steps = self.computer.steps, "Program ended");
        }
        Ok(ended)
    }

    #[wasm_bindgen(getter)]
    pub fn labels(&self) -> LabelsWithLines {
        LabelsWithLines(self.debug_info.labels.clone())
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> State {
        let registers = &self.computer.registers;
        State {
            accumulator: registers.accumulator,
            pc: registers.pc,
            flags: registers.flags.to_string(),
            ended: registers.has_ended(),
            steps: self.computer.steps,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn output(&self) -> Output {
        Output(self.computer.output.iter().copied().collect())
    }

    #[wasm_bindgen(getter)]
    pub fn listing(&self) -> String {
        self.debug_info.listing(&self.computer.program).to_string()
    }

    pub fn memory_view(&self, start: usize, end: usize) -> Result<MemoryView, JsValue> {
        let cells = self
            .computer
            .memory
            .cells()
            .get(start..end)
            .ok_or_else(|| JsValue::from(format!("invalid memory range {start}..{end}")))?;

        Ok(MemoryView {
            start,
            end,
            cells: cells.to_vec(),
        })
    }
}
