//! WebAssembly bindings for the LC-3 VM.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.
//! Program input is buffered from JavaScript with `push_input`; program
//! output accumulates until collected with `take_output`.

use wasm_bindgen::prelude::*;
use crate::cpu::{Console, Reg};
use crate::{Cpu, Image, ByteOrder};
use std::io::Cursor;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly VM wrapper.
#[wasm_bindgen]
pub struct WasmVm {
    cpu: Cpu,
    program: Vec<u16>,
    offset: u16,
    console: Console<Cursor<Vec<u8>>, Vec<u8>>,
}

#[wasm_bindgen]
impl WasmVm {
    /// Create a new VM instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            program: Vec::new(),
            offset: 0,
            console: Console::new(Cursor::new(Vec::new()), Vec::new()),
        }
    }

    /// Load a raw image. Returns the number of words placed in memory.
    #[wasm_bindgen]
    pub fn load_image(&mut self, bytes: &[u8], big_endian: bool, offset: u16) -> usize {
        let order = if big_endian { ByteOrder::Big } else { ByteOrder::Little };
        let image = Image::from_bytes(bytes, order);

        self.program = image.words.clone();
        self.offset = offset;
        self.cpu = Cpu::new();
        self.cpu.load_image(&image, offset)
    }

    /// Append text to the program's input stream.
    #[wasm_bindgen]
    pub fn push_input(&mut self, text: &str) {
        self.console.input_mut().get_mut().extend_from_slice(text.as_bytes());
    }

    /// Step one instruction. Returns the decoded instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if !self.cpu.is_running() {
            return Err(JsError::new("CPU is halted"));
        }

        let instr = self.cpu.step(&mut self.console)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(format!("{:?}", instr))
    }

    /// Run until halt or max cycles.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(&mut self.console, max_cycles as u64)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.cpu.cycles)
    }

    /// Reset the VM to its initial state with the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu = Cpu::new();
        self.console = Console::new(Cursor::new(Vec::new()), Vec::new());
        if !self.program.is_empty() {
            self.cpu.load_program(self.offset, &self.program);
        }
    }

    /// Collect and clear everything the program has written so far.
    #[wasm_bindgen]
    pub fn take_output(&mut self) -> String {
        let bytes = std::mem::take(self.console.output_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.cpu.regs.pc
    }

    /// Get general purpose register `index` (0-7).
    #[wasm_bindgen]
    pub fn register(&self, index: u8) -> Result<u16, JsError> {
        if index >= 8 {
            return Err(JsError::new(&format!("register R{} does not exist", index)));
        }
        Ok(self.cpu.regs.get(Reg::new(index)))
    }

    /// Get condition flag as string.
    #[wasm_bindgen]
    pub fn condition(&self) -> String {
        format!("{:?}", self.cpu.regs.cond)
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Get memory cell value at address.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: u16) -> u16 {
        self.cpu.mem.read(addr)
    }

    /// Get `count` memory cells starting at `start`.
    #[wasm_bindgen]
    pub fn memory_range(&self, start: u16, count: usize) -> Vec<u16> {
        self.cpu.mem.dump(start, count).into_iter().map(|(_, value)| value).collect()
    }

    /// Get registers as JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.regs)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmVm {
    fn default() -> Self {
        Self::new()
    }
}
