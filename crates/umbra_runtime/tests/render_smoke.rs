//! Headless smoke test: schedules a small shadowed scene and runs the
//! shadow and color passes on a real device. Skips when no adapter is
//! available.

use glam::{Mat4, Vec3};
use umbra_render::{
    CascadeShadowSettings, DirectionalLight, FrameScheduler, Light, PointLight,
    ProjectedShadowSettings, ShadowMapPool, ShadowSet, ViewFrame,
};
use umbra_runtime::{
    generate_cube, generate_plane, GpuContext, GpuMesh, LightPassRenderer, MeshInstance,
    ShadowPassRenderer, ShadowTarget,
};

#[test]
fn test_shadowed_frame_renders() {
    let _ = env_logger::builder().is_test(true).try_init();

    let ctx = match GpuContext::new_headless() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("skipping: {}", e);
            return;
        }
    };
    let device = &ctx.device;
    let queue = &ctx.queue;

    // Scene: a ground plane and a floating cube under two lights.
    let (vertices, indices) = generate_plane(20.0);
    let plane = GpuMesh::new(device, &vertices, &indices);
    let (vertices, indices) = generate_cube(1.0);
    let cube = GpuMesh::new(device, &vertices, &indices);
    let meshes = [plane, cube];

    let instances = [
        MeshInstance::new(0, Vec3::ZERO),
        MeshInstance::new(1, Vec3::new(0.0, 2.0, 0.0)).with_color([0.8, 0.2, 0.2, 1.0]),
    ];

    let lights = vec![
        Light::Directional(DirectionalLight::new([0.3, -0.8, 0.2]).with_shadow(
            CascadeShadowSettings::default().with_cascades(&[10.0, 40.0]),
        )),
        Light::Point(
            PointLight::new([3.0, 4.0, 0.0]).with_shadow(ProjectedShadowSettings::default()),
        ),
    ];

    let mut pool = ShadowMapPool::new(1024, 8);
    let camera_position = [0.0, 3.0, 8.0];
    let sets: Vec<Option<ShadowSet>> = lights
        .iter()
        .enumerate()
        .map(|(i, light)| {
            let alloc = pool.allocate(i as u64, light.shadow_view_count() as u32, 1024)?;
            ShadowSet::build(light, &alloc, camera_position)
        })
        .collect();
    assert_eq!(pool.free_count(), 0); // 2 cascades + 6 faces

    let view = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0)
        * Mat4::look_at_rh(Vec3::from(camera_position), Vec3::ZERO, Vec3::Y);
    let frame = ViewFrame {
        camera_position,
        view_proj: view.to_cols_array_2d(),
    };

    let schedule = FrameScheduler::default().schedule(frame, &lights, &sets);
    assert_eq!(schedule.shadow_passes.len(), 8);
    assert_eq!(schedule.color_passes.len(), 2);

    // Offscreen color target.
    let size = (256u32, 256u32);
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("smoke_target"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let color_view = color.create_view(&Default::default());

    let target = ShadowTarget::new(device, 1024, 8);
    let shadow_renderer = ShadowPassRenderer::new(device);
    let mut light_renderer = LightPassRenderer::new(device, wgpu::TextureFormat::Rgba8UnormSrgb);
    let shadow_bind_group = light_renderer.create_shadow_bind_group(device, &target);

    shadow_renderer.render(device, queue, &target, &schedule, &meshes, &instances);
    light_renderer.render(
        device,
        queue,
        &color_view,
        size,
        &schedule,
        &shadow_bind_group,
        &meshes,
        &instances,
    );

    device.poll(wgpu::Maintain::Wait);
}
