use std::rc::Rc;
use wallgl::prelude::*;

fn headless() -> Rc<HeadlessBackend> {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = Rc::new(HeadlessBackend::new());
    Context::init_shared(backend.clone());
    backend
}

fn program_of<M: Material>(material: &M) -> ProgramHandle {
    material
        .core()
        .program()
        .expect("material has a program")
        .handle()
}

fn sun() -> Light {
    Light::directional(-Vec3::Z).with_position(Vec3::new(0.0, 0.0, 1.0))
}

fn triangle() -> Geometry {
    Geometry::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        Some(vec![Vec3::Z; 3]),
        None,
        Some(vec![RED; 3]),
        vec![0, 1, 2],
    )
}

/// Uniform names, program binds and draws, in call order.
fn events(backend: &HeadlessBackend) -> Vec<String> {
    backend
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            Command::SetUniform { name, .. } => Some(name),
            Command::UseProgram(_) => Some("use".to_string()),
            Command::DrawElements { .. } => Some("draw".to_string()),
            _ => None,
        })
        .collect()
}

fn position(events: &[String], name: &str) -> usize {
    events
        .iter()
        .position(|e| e == name)
        .unwrap_or_else(|| panic!("no `{}` in {:?}", name, events))
}

#[test]
fn phong_defaults() {
    let _backend = headless();
    let material = PhongMaterial::new().unwrap();
    assert_eq!(material.specular_color(), WHITE);
    assert_eq!(material.ambient_color(), Color::new(0.2, 0.2, 0.2, 1.0));
    assert_eq!(material.shininess(), 96.0);
    assert!(!material.uses_texture());
}

#[test]
fn phong_explicit_parameters_reach_the_shader() {
    let backend = headless();
    let material = PhongMaterial::with_params(RED, BLUE, 12.0).unwrap();
    let program = program_of(&material);

    material.use_program();
    assert_eq!(backend.current_program(), Some(program));
    assert_eq!(
        backend.uniform(program, "uSpecularColor"),
        Some(UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]))
    );
    assert_eq!(
        backend.uniform(program, "uAmbientColor"),
        Some(UniformValue::Vec4([0.0, 0.0, 1.0, 1.0]))
    );
    assert_eq!(
        backend.uniform(program, "uShininess"),
        Some(UniformValue::Float(12.0))
    );
    assert_eq!(
        backend.uniform(program, "uUseTexture"),
        Some(UniformValue::Bool(false))
    );
}

#[test]
fn argb_setters_are_normalized() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    material.set_specular_argb(0xff00ff00);
    material.use_program();
    assert_eq!(
        backend.uniform(program_of(&material), "uSpecularColor"),
        Some(UniformValue::Vec4([0.0, 1.0, 0.0, 1.0]))
    );
}

#[test]
fn light_is_uploaded_immediately() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    let program = program_of(&material);

    // No use_program yet: the write must still land in this material's program.
    material
        .set_light(&sun().with_object_transform(true))
        .unwrap();
    assert_eq!(
        backend.uniform(program, "uLightPos"),
        Some(UniformValue::Vec3([0.0, 0.0, 1.0]))
    );
    assert_eq!(
        backend.uniform(program, "uUseObjectTransform"),
        Some(UniformValue::Bool(true))
    );
    assert_eq!(material.core().light().unwrap().position, Vec3::Z);
}

#[test]
fn non_directional_lights_are_rejected() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    backend.clear_commands();

    for light in [Light::point(10.0), Light::spot(0.2, 0.4, 10.0)] {
        let err = material.set_light(&light).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "directional",
                ..
            }
        ));
    }
    assert!(backend.uniform_writes("uLightPos").is_empty());
    assert!(material.core().light().is_none());
}

#[test]
fn normal_matrix_follows_the_model_matrix() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    let program = program_of(&material);

    material.set_model_matrix(&Mat4::from_scale(Vec3::splat(2.0)));
    let expected = Mat3::from_diagonal(Vec3::splat(0.5));
    assert!(material.normal_matrix().abs_diff_eq(expected, 1.0e-6));
    assert_eq!(
        backend.uniform(program, "uNMatrix"),
        Some(UniformValue::Mat3(material.normal_matrix().to_cols_array()))
    );
    assert_eq!(
        backend.uniform(program, "uMMatrix"),
        Some(UniformValue::Mat4(
            Mat4::from_scale(Vec3::splat(2.0)).to_cols_array()
        ))
    );
}

#[test]
fn setting_the_same_model_matrix_twice_is_idempotent() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    let model = Mat4::from_scale_rotation_translation(
        Vec3::new(1.0, 3.0, 0.5),
        Quat::from_rotation_y(1.1),
        Vec3::new(4.0, 5.0, 6.0),
    );

    material.set_model_matrix(&model);
    let first = *material.normal_matrix();
    material.set_model_matrix(&model);
    assert_eq!(*material.normal_matrix(), first);

    let writes = backend.uniform_writes("uNMatrix");
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], writes[1]);
}

#[test]
fn degenerate_model_matrix_does_not_abort() {
    let _backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    let flat = Mat4::from_scale(Vec3::new(1.0, 1.0, 0.0));
    material.set_model_matrix(&flat);
    assert_eq!(*material.normal_matrix(), Mat3::from_mat4(flat));
}

#[test]
fn missing_normal_matrix_uniform_is_fatal() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    let old = program_of(&material);

    // The uniform is still declared, but nothing reads it any more.
    let vertex = PHONG_VERTEX_SRC.replace("uNMatrix * aNormal", "aNormal");
    let err = material
        .set_shaders(&vertex, PHONG_FRAGMENT_SRC)
        .unwrap_err();
    assert_eq!(
        err,
        Error::MissingUniform {
            name: "uNMatrix".to_string()
        }
    );

    assert!(!backend.is_program_live(old));
    assert!(material.core().program().is_none());
    assert_eq!(backend.live_programs(), 0);
    assert!(backend.draw_calls().is_empty());
}

#[test]
fn missing_optional_uniforms_are_skipped() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();

    let fragment = PHONG_FRAGMENT_SRC.replace("Ks * uSpecularColor", "Ks * vec4(1.0)");
    material.set_shaders(PHONG_VERTEX_SRC, &fragment).unwrap();
    backend.clear_commands();

    material.use_program();
    assert!(backend.uniform_writes("uSpecularColor").is_empty());
    assert_eq!(
        backend.uniform_writes("uShininess"),
        vec![UniformValue::Float(96.0)]
    );
    assert_eq!(backend.invalid_operations(), 0);
}

#[test]
fn set_shaders_replaces_the_program() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    let old = program_of(&material);

    material
        .set_shaders(PHONG_VERTEX_SRC, PHONG_FRAGMENT_SRC)
        .unwrap();
    let new = program_of(&material);

    assert_ne!(old, new);
    assert!(!backend.is_program_live(old));
    assert_eq!(backend.live_programs(), 1);

    // Bindings point into the new program.
    material.use_program();
    assert!(backend.uniform(new, "uShininess").is_some());
    assert_eq!(backend.invalid_operations(), 0);
}

#[test]
fn shader_errors_are_surfaced() {
    let _backend = headless();
    let mut material = PhongMaterial::new().unwrap();

    let err = material
        .set_shaders("void main() {", PHONG_FRAGMENT_SRC)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Compile {
            stage: ShaderStage::Vertex,
            ..
        }
    ));

    let vertex = "attribute vec4 aPosition; void main() { gl_Position = aPosition; }";
    let err = material
        .set_shaders(vertex, PHONG_FRAGMENT_SRC)
        .unwrap_err();
    assert!(matches!(err, Error::Link { .. }));
}

#[test]
fn material_releases_its_program_on_drop() {
    let backend = headless();
    let material = PhongMaterial::new().unwrap();
    let particle = ParticleMaterial::new().unwrap();
    assert_eq!(backend.live_programs(), 2);

    drop(material);
    drop(particle);
    assert_eq!(backend.live_programs(), 0);
}

#[test]
fn texture_switches_the_diffuse_source() {
    let backend = headless();
    let mut material = PhongMaterial::new().unwrap();
    let program = program_of(&material);

    material.set_texture(Some(Texture::solid(LIME)));
    material.use_program();
    assert_eq!(
        backend.uniform(program, "uUseTexture"),
        Some(UniformValue::Bool(true))
    );
    assert_eq!(
        backend.uniform(program, "uTexture0"),
        Some(UniformValue::Int(0))
    );
    assert_eq!(backend.live_textures(), 1);

    material.set_texture(None);
    material.use_program();
    assert_eq!(
        backend.uniform(program, "uUseTexture"),
        Some(UniformValue::Bool(false))
    );
    assert_eq!(backend.live_textures(), 0);
}

#[test]
fn object_render_follows_the_renderer_protocol() {
    let backend = headless();
    let mut object = Object3d::new(triangle(), PhongMaterial::new().unwrap());
    object.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
    let light = sun();
    let frame = RenderFrame::new()
        .with_view(Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y))
        .with_projection(Mat4::perspective_rh_gl(1.0, 1.5, 0.1, 100.0))
        .with_light(&light);

    backend.clear_commands();
    object.render(&frame).unwrap();

    let events = events(&backend);
    let model = position(&events, "uMMatrix");
    let normal = position(&events, "uNMatrix");
    let light_pos = position(&events, "uLightPos");
    let bind = position(&events, "use");
    let mvp = position(&events, "uMVPMatrix");
    let draw = position(&events, "draw");
    assert!(model < normal && normal < light_pos && light_pos < bind);
    assert!(bind < mvp && mvp < draw);

    let program = program_of(object.material());
    assert_eq!(
        backend.draw_calls(),
        vec![(Some(program), DrawMode::Triangles, 3)]
    );
    assert!(!backend.render_flags().contains(RenderFlags::TRANSPARENT));

    // Same light next frame: not uploaded again.
    backend.clear_commands();
    object.render(&frame).unwrap();
    assert!(backend.uniform_writes("uLightPos").is_empty());
    assert_eq!(backend.draw_calls().len(), 1);
}

#[test]
fn material_without_program_is_not_drawn() {
    let backend = headless();
    let mut particle = Particle::new().unwrap();
    let mut object = Object3d::new(triangle(), PhongMaterial::new().unwrap());
    let frame = RenderFrame::new();

    let vertex = PHONG_VERTEX_SRC.replace("uNMatrix * aNormal", "aNormal");
    assert!(object
        .material_mut()
        .set_shaders(&vertex, PHONG_FRAGMENT_SRC)
        .is_err());
    assert_eq!(
        object.material().core().attributes(),
        VertexAttributes::default()
    );

    particle.render(&frame).unwrap();
    let particle_program = program_of(particle.material());
    object.render(&frame).unwrap();

    assert_eq!(
        backend.draw_calls(),
        vec![(Some(particle_program), DrawMode::Points, 1)]
    );
    assert_eq!(backend.current_program(), Some(particle_program));
}

#[test]
fn light_survives_a_program_rebuild() {
    let backend = headless();
    let mut object = Object3d::new(triangle(), PhongMaterial::new().unwrap());
    let light = sun().with_object_transform(true);
    let frame = RenderFrame::new().with_light(&light);

    object.render(&frame).unwrap();
    object
        .material_mut()
        .set_shaders(PHONG_VERTEX_SRC, PHONG_FRAGMENT_SRC)
        .unwrap();
    let rebuilt = program_of(object.material());

    object.render(&frame).unwrap();
    assert_eq!(
        backend.uniform(rebuilt, "uLightPos"),
        Some(UniformValue::Vec3([0.0, 0.0, 1.0]))
    );
    assert_eq!(
        backend.uniform(rebuilt, "uUseObjectTransform"),
        Some(UniformValue::Bool(true))
    );
    assert_eq!(backend.draw_calls().len(), 2);
}

#[test]
fn incompatible_light_aborts_the_draw() {
    let backend = headless();
    let mut object = Object3d::new(triangle(), PhongMaterial::new().unwrap());
    let light = Light::point(50.0);

    let result = object.render(&RenderFrame::new().with_light(&light));
    assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    assert!(backend.draw_calls().is_empty());
}

#[test]
fn hidden_objects_are_skipped() {
    let backend = headless();
    let mut object = Object3d::new(triangle(), PhongMaterial::new().unwrap());
    object.set_visible(false);
    object.render(&RenderFrame::new()).unwrap();
    assert!(backend.draw_calls().is_empty());
}

#[test]
fn particle_pushes_its_point_size_every_draw() {
    let backend = headless();
    let mut particle = Particle::new().unwrap();
    let light = sun();
    let frame = RenderFrame::new().with_light(&light);

    particle.render(&frame).unwrap();
    assert_eq!(
        backend.uniform_writes("uPointSize").last(),
        Some(&UniformValue::Float(10.0))
    );

    particle.set_point_size(25.0);
    backend.clear_commands();
    particle.render(&frame).unwrap();

    // The size refresh runs between binding the program and drawing.
    let events = events(&backend);
    let refresh = events.iter().rposition(|e| e == "uPointSize").unwrap();
    assert!(position(&events, "use") < refresh);
    assert!(refresh < position(&events, "draw"));
    assert_eq!(
        backend.uniform_writes("uPointSize").last(),
        Some(&UniformValue::Float(25.0))
    );

    let program = program_of(particle.material());
    assert_eq!(
        backend.draw_calls(),
        vec![(Some(program), DrawMode::Points, 1)]
    );
    assert!(backend.render_flags().contains(RenderFlags::TRANSPARENT));
}

#[test]
fn particle_from_config() {
    let _backend = headless();
    let particle = Particle::from_config(&ParticleConfig { point_size: 3.0 }).unwrap();
    assert_eq!(particle.point_size(), 3.0);
    assert_eq!(particle.geometry().coords().unwrap(), &[Vec3::ZERO]);
    assert_eq!(particle.geometry().normals().unwrap(), &[Vec3::Z]);
    assert_eq!(particle.geometry().colors().unwrap(), vec![WHITE]);
}
