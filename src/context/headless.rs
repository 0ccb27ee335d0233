//! A backend without a GPU.
//!
//! `HeadlessBackend` understands just enough GLSL to behave like a driver from the
//! point of view of a material: it rejects malformed sources, links stages by their
//! varyings, only reports uniforms and attributes that the code actually reads, and
//! remembers every call so the resulting device state can be inspected.

use super::{
    BufferHandle, BufferType, DrawMode, GraphicsBackend, ProgramHandle, RenderFlags, ShaderObject,
    ShaderStage, TextureHandle, UniformLocation, UniformValue,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// One call received by a [`HeadlessBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// A stage was compiled.
    CompileShader(ShaderStage, ShaderObject),
    /// A program was linked.
    LinkProgram(ProgramHandle),
    /// A stage was released.
    DeleteShader(ShaderObject),
    /// A program was released.
    DeleteProgram(ProgramHandle),
    /// A program was bound (or unbound).
    UseProgram(Option<ProgramHandle>),
    /// A uniform was written.
    SetUniform {
        /// Target program.
        program: ProgramHandle,
        /// Uniform name.
        name: String,
        /// Written value.
        value: UniformValue,
    },
    /// A buffer was allocated.
    CreateBuffer(BufferHandle, BufferType, usize),
    /// A buffer was overwritten.
    UpdateBuffer(BufferHandle, usize),
    /// A buffer was released.
    DeleteBuffer(BufferHandle),
    /// A texture was allocated.
    CreateTexture(TextureHandle, u32, u32),
    /// A texture was bound to a unit.
    BindTexture(u32, TextureHandle),
    /// A texture was released.
    DeleteTexture(TextureHandle),
    /// An attribute was fed from a buffer.
    BindAttribute(BufferHandle, u32),
    /// Fixed-function state was changed.
    SetRenderFlags(RenderFlags),
    /// A draw call was issued.
    DrawElements {
        /// Program bound at draw time.
        program: Option<ProgramHandle>,
        /// Primitive assembly.
        mode: DrawMode,
        /// Number of indices drawn.
        count: u32,
    },
}

/// Declarations of one stage.
#[derive(Clone, Debug, Default)]
struct StageInfo {
    stage: Option<ShaderStage>,
    uniforms: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    varyings: Vec<(String, String)>,
    used: HashSet<String>,
}

impl StageInfo {
    fn active<'a>(
        &'a self,
        decls: &'a [(String, String)],
    ) -> impl Iterator<Item = &'a (String, String)> + 'a {
        decls.iter().filter(move |(_, name)| self.used.contains(name))
    }
}

#[derive(Clone, Debug)]
struct ProgramInfo {
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, StageInfo>,
    programs: HashMap<u32, ProgramInfo>,
    current_program: Option<ProgramHandle>,
    uniform_values: HashMap<(u32, u32), UniformValue>,
    buffers: HashMap<u32, (BufferType, Vec<u8>)>,
    textures: HashMap<u32, (u32, u32)>,
    render_flags: RenderFlags,
    invalid_operations: usize,
    commands: Vec<Command>,
}

impl State {
    fn fresh_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn invalid(&mut self, what: &str) {
        log::warn!("headless backend: invalid operation: {}", what);
        self.invalid_operations += 1;
    }
}

/// A recording, GPU-less [`GraphicsBackend`].
#[derive(Default)]
pub struct HeadlessBackend {
    state: RefCell<State>,
}

impl HeadlessBackend {
    /// Creates a backend with no objects.
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls received so far, oldest first.
    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Forgets the recorded calls. Device state is kept.
    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// The program currently bound.
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().current_program
    }

    /// Whether `program` exists and has not been deleted.
    pub fn is_program_live(&self, program: ProgramHandle) -> bool {
        self.state.borrow().programs.contains_key(&program.0)
    }

    /// Number of programs not yet deleted.
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Number of buffers not yet deleted.
    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Number of textures not yet deleted.
    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    /// Content of a live buffer.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&buffer.0)
            .map(|(_, data)| data.clone())
    }

    /// Active uniform names of a program, in location order.
    pub fn active_uniforms(&self, program: ProgramHandle) -> Vec<String> {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|p| p.uniforms.clone())
            .unwrap_or_default()
    }

    /// Last value written to the uniform `name` of `program`.
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let info = state.programs.get(&program.0)?;
        let location = info.uniforms.iter().position(|u| u == name)? as u32;
        state.uniform_values.get(&(program.0, location)).copied()
    }

    /// Every value written to a uniform called `name`, across programs, oldest first.
    pub fn uniform_writes(&self, name: &str) -> Vec<UniformValue> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform { name: n, value, .. } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Every draw call issued, oldest first.
    pub fn draw_calls(&self) -> Vec<(Option<ProgramHandle>, DrawMode, u32)> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawElements {
                    program,
                    mode,
                    count,
                } => Some((*program, *mode, *count)),
                _ => None,
            })
            .collect()
    }

    /// Fixed-function state of the last draw.
    pub fn render_flags(&self) -> RenderFlags {
        self.state.borrow().render_flags
    }

    /// Number of calls a real driver would have rejected.
    pub fn invalid_operations(&self) -> usize {
        self.state.borrow().invalid_operations
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderObject, String> {
        let mut info = scan(source)?;
        info.stage = Some(stage);

        if stage == ShaderStage::Fragment && !info.attributes.is_empty() {
            return Err(format!(
                "attribute `{}` declared in a fragment shader",
                info.attributes[0].1
            ));
        }

        let mut state = self.state.borrow_mut();
        let shader = ShaderObject(state.fresh_id());
        let _ = state.shaders.insert(shader.0, info);
        state.commands.push(Command::CompileShader(stage, shader));
        Ok(shader)
    }

    fn link_program(
        &self,
        vertex: ShaderObject,
        fragment: ShaderObject,
    ) -> Result<ProgramHandle, String> {
        let mut state = self.state.borrow_mut();
        let vs = state
            .shaders
            .get(&vertex.0)
            .cloned()
            .ok_or_else(|| format!("no shader object {}", vertex.0))?;
        let fs = state
            .shaders
            .get(&fragment.0)
            .cloned()
            .ok_or_else(|| format!("no shader object {}", fragment.0))?;

        if vs.stage != Some(ShaderStage::Vertex) || fs.stage != Some(ShaderStage::Fragment) {
            return Err("a program needs one vertex and one fragment shader".to_string());
        }

        for (ty, name) in fs.active(&fs.varyings) {
            match vs.varyings.iter().find(|(_, n)| n == name) {
                None => {
                    return Err(format!(
                        "fragment varying `{}` is not declared by the vertex shader",
                        name
                    ))
                }
                Some((vty, _)) if vty != ty => {
                    return Err(format!(
                        "varying `{}` declared as `{}` and `{}`",
                        name, vty, ty
                    ))
                }
                Some(_) => {}
            }
        }

        let mut uniforms: Vec<String> = Vec::new();
        for (ty, name) in vs.active(&vs.uniforms).chain(fs.active(&fs.uniforms)) {
            let mut declared = vs.uniforms.iter().chain(fs.uniforms.iter());
            if let Some((other, _)) = declared.find(|(t, n)| n == name && t != ty) {
                return Err(format!(
                    "uniform `{}` declared as `{}` and `{}`",
                    name, ty, other
                ));
            }
            if !uniforms.contains(name) {
                uniforms.push(name.clone());
            }
        }

        let attributes = vs
            .active(&vs.attributes)
            .map(|(_, name)| name.clone())
            .collect();

        let program = ProgramHandle(state.fresh_id());
        let _ = state.programs.insert(
            program.0,
            ProgramInfo {
                uniforms,
                attributes,
            },
        );
        state.commands.push(Command::LinkProgram(program));
        Ok(program)
    }

    fn delete_shader(&self, shader: ShaderObject) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader.0).is_none() {
            state.invalid("delete of an unknown shader");
        }
        state.commands.push(Command::DeleteShader(shader));
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.0).is_none() {
            state.invalid("delete of an unknown program");
        }
        state.uniform_values.retain(|(p, _), _| *p != program.0);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.commands.push(Command::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.borrow_mut();
        if let Some(p) = program {
            if !state.programs.contains_key(&p.0) {
                state.invalid("use of an unknown program");
                return;
            }
        }
        state.current_program = program;
        state.commands.push(Command::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let info = state.programs.get(&program.0)?;
        info.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let info = state.programs.get(&program.0)?;
        info.attributes
            .iter()
            .position(|a| a == name)
            .map(|i| i as u32)
    }

    fn set_uniform(&self, program: ProgramHandle, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let name = state
            .programs
            .get(&program.0)
            .map(|info| info.uniforms.get(location.0 as usize).cloned());
        let Some(name) = name else {
            state.invalid("uniform write to an unknown program");
            return;
        };
        let Some(name) = name else {
            state.invalid("uniform write to an unknown location");
            return;
        };
        let _ = state.uniform_values.insert((program.0, location.0), value);
        state.commands.push(Command::SetUniform {
            program,
            name,
            value,
        });
    }

    fn create_buffer(&self, buf_type: BufferType, data: &[u8]) -> Result<BufferHandle, String> {
        let mut state = self.state.borrow_mut();
        let buffer = BufferHandle(state.fresh_id());
        let _ = state.buffers.insert(buffer.0, (buf_type, data.to_vec()));
        state
            .commands
            .push(Command::CreateBuffer(buffer, buf_type, data.len()));
        Ok(buffer)
    }

    fn update_buffer(&self, buffer: BufferHandle, buf_type: BufferType, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let updated = match state.buffers.get_mut(&buffer.0) {
            Some(entry) if entry.0 == buf_type => {
                entry.1 = data.to_vec();
                true
            }
            _ => false,
        };
        if !updated {
            state.invalid("update of an unknown buffer");
            return;
        }
        state.commands.push(Command::UpdateBuffer(buffer, data.len()));
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer.0).is_none() {
            state.invalid("delete of an unknown buffer");
        }
        state.commands.push(Command::DeleteBuffer(buffer));
    }

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        rgba: &[u8],
        _repeat: bool,
    ) -> Result<TextureHandle, String> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(format!(
                "{} bytes given for a {}x{} RGBA texture",
                rgba.len(),
                width,
                height
            ));
        }
        let mut state = self.state.borrow_mut();
        let texture = TextureHandle(state.fresh_id());
        let _ = state.textures.insert(texture.0, (width, height));
        state
            .commands
            .push(Command::CreateTexture(texture, width, height));
        Ok(texture)
    }

    fn bind_texture(&self, unit: u32, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        if !state.textures.contains_key(&texture.0) {
            state.invalid("bind of an unknown texture");
            return;
        }
        state.commands.push(Command::BindTexture(unit, texture));
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture.0).is_none() {
            state.invalid("delete of an unknown texture");
        }
        state.commands.push(Command::DeleteTexture(texture));
    }

    fn bind_attribute(&self, buffer: BufferHandle, location: u32, _components: u32) {
        let mut state = self.state.borrow_mut();
        if !state.buffers.contains_key(&buffer.0) {
            state.invalid("attribute bound to an unknown buffer");
            return;
        }
        state.commands.push(Command::BindAttribute(buffer, location));
    }

    fn set_render_flags(&self, flags: RenderFlags) {
        let mut state = self.state.borrow_mut();
        state.render_flags = flags;
        state.commands.push(Command::SetRenderFlags(flags));
    }

    fn draw_elements(&self, mode: DrawMode, indices: BufferHandle, count: u32) {
        let mut state = self.state.borrow_mut();
        let indexable = matches!(
            state.buffers.get(&indices.0),
            Some((BufferType::ElementArray, data)) if data.len() >= count as usize * 2
        );
        if !indexable {
            state.invalid("draw with a missing or short index buffer");
            return;
        }
        if state.current_program.is_none() {
            state.invalid("draw without a program");
            return;
        }
        let program = state.current_program;
        state.commands.push(Command::DrawElements {
            program,
            mode,
            count,
        });
    }
}

/*
 * GLSL scanning.
 */
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'/') {
            for c in chars.by_ref() {
                if c == '\n' {
                    out.push('\n');
                    break;
                }
            }
        } else if c == '/' && chars.peek() == Some(&'*') {
            let _ = chars.next();
            let mut prev = '\0';
            for c in chars.by_ref() {
                if prev == '*' && c == '/' {
                    break;
                }
                prev = c;
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }

    out
}

fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| t.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_'))
}

fn is_precision(token: &str) -> bool {
    matches!(token, "lowp" | "mediump" | "highp")
}

fn scan(source: &str) -> Result<StageInfo, String> {
    let source = strip_comments(source);
    let mut info = StageInfo::default();
    let mut body = String::new();
    let mut statement = String::new();
    let mut depth = 0i32;

    for c in source.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    body.push_str(&statement);
                    statement.clear();
                }
                depth += 1;
                body.push(c);
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err("syntax error: unexpected '}'".to_string());
                }
                body.push(c);
            }
            ';' if depth == 0 => {
                declare(&mut info, &statement, &mut body);
                statement.clear();
            }
            _ if depth == 0 => statement.push(c),
            _ => body.push(c),
        }
    }

    if depth != 0 {
        return Err("syntax error: unexpected end of source, missing '}'".to_string());
    }
    if !statement.trim().is_empty() {
        return Err(format!(
            "syntax error: unterminated statement `{}`",
            statement.trim()
        ));
    }

    let tokens: Vec<&str> = identifiers(&body).collect();
    if !tokens.windows(2).any(|w| w == ["void", "main"]) {
        return Err("missing entry point `void main()`".to_string());
    }

    info.used = tokens.into_iter().map(str::to_string).collect();
    Ok(info)
}

fn declare(info: &mut StageInfo, statement: &str, body: &mut String) {
    let mut tokens = identifiers(statement).filter(|t| !is_precision(t));
    let target = match tokens.next() {
        Some("uniform") => &mut info.uniforms,
        Some("attribute") => &mut info.attributes,
        Some("varying") => &mut info.varyings,
        _ => {
            body.push_str(statement);
            body.push(';');
            return;
        }
    };

    if let Some(ty) = tokens.next() {
        for name in tokens {
            target.push((ty.to_string(), name.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "
        uniform mat4 uMVPMatrix;
        uniform float uUnused; // optimised away
        attribute vec4 aPosition;
        varying vec4 vColor;
        void main() {
            gl_Position = uMVPMatrix * aPosition;
            vColor = vec4(1.0);
        }";

    const FS: &str = "
        precision mediump float;
        varying vec4 vColor;
        uniform vec4 uTint;
        void main() { gl_FragColor = vColor * uTint; }";

    #[test]
    fn unused_uniforms_are_inactive() {
        let backend = HeadlessBackend::new();
        let vs = backend.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = backend.compile_shader(ShaderStage::Fragment, FS).unwrap();
        let program = backend.link_program(vs, fs).unwrap();

        assert_eq!(backend.active_uniforms(program), vec!["uMVPMatrix", "uTint"]);
        assert!(backend.uniform_location(program, "uUnused").is_none());
        assert_eq!(backend.attribute_location(program, "aPosition"), Some(0));
    }

    #[test]
    fn malformed_sources_do_not_compile() {
        let backend = HeadlessBackend::new();
        assert!(backend
            .compile_shader(ShaderStage::Vertex, "void main() {")
            .is_err());
        assert!(backend
            .compile_shader(ShaderStage::Vertex, "uniform float x;")
            .is_err());
        assert!(backend
            .compile_shader(ShaderStage::Fragment, "attribute vec4 a; void main() { a; }")
            .is_err());
    }

    #[test]
    fn unmatched_varying_fails_to_link() {
        let backend = HeadlessBackend::new();
        let vs = backend
            .compile_shader(ShaderStage::Vertex, "void main() { gl_Position = vec4(0.0); }")
            .unwrap();
        let fs = backend.compile_shader(ShaderStage::Fragment, FS).unwrap();
        let err = backend.link_program(vs, fs).unwrap_err();
        assert!(err.contains("vColor"));
    }

    #[test]
    fn writes_to_deleted_programs_are_rejected() {
        let backend = HeadlessBackend::new();
        let vs = backend.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = backend.compile_shader(ShaderStage::Fragment, FS).unwrap();
        let program = backend.link_program(vs, fs).unwrap();
        let loc = backend.uniform_location(program, "uTint").unwrap();

        backend.set_uniform(program, loc, UniformValue::Vec4([1.0; 4]));
        assert_eq!(
            backend.uniform(program, "uTint"),
            Some(UniformValue::Vec4([1.0; 4]))
        );

        backend.delete_program(program);
        backend.set_uniform(program, loc, UniformValue::Vec4([0.0; 4]));
        assert_eq!(backend.invalid_operations(), 1);
        assert_eq!(backend.live_programs(), 0);
    }
}
