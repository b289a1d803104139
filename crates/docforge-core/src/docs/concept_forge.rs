//! Bundled declaration of the `concept_forge` scene API
//!
//! This is the surface the synthesis templates are written against: a
//! render loop owner (`ConceptForge`), scene entities and vector math.

use super::registry::{ClassDef, ModuleDef};

pub const MODULE_NAME: &str = "concept_forge";

pub fn module() -> ModuleDef {
    ModuleDef::new(MODULE_NAME)
        .constant("__version__")
        .constant("DEFAULT_FOV")
        .function("sin")
        .class(vec3())
        .class(transform())
        .class(entity())
        .class(concept_forge())
        .class(ClassDef::new("_RenderQueue").method(
            "flush",
            "flush(self) -> None\nSubmit queued draw calls.",
        ))
}

fn vec3() -> ClassDef {
    ClassDef::new("Vec3")
        .method(
            "__add__",
            "__add__(self, other: Vec3) -> Vec3\nComponent-wise sum of two vectors.",
        )
        .method(
            "__sub__",
            "__sub__(self, other: Vec3) -> Vec3\nComponent-wise difference of two vectors.",
        )
        .method(
            "__mul__",
            "__mul__(self, scalar: float) -> Vec3\nScale every component by a scalar.",
        )
        .method(
            "__repr__",
            "__repr__(self) -> str\nReadable form, e.g. Vec3(1.0, 2.0, 3.0).",
        )
        .method("__eq__", "__eq__(self, other: Vec3) -> bool\nExact equality.")
        .method(
            "length",
            "length(self) -> float\nEuclidean length of the vector.",
        )
        .method(
            "normalized",
            "normalized(self) -> Vec3\nUnit vector pointing in the same direction.",
        )
        .method(
            "dot",
            "dot(self, other: Vec3) -> float\nDot product with another vector.",
        )
        .method(
            "cross",
            "cross(self, other: Vec3) -> Vec3\nCross product with another vector.",
        )
        .attribute("x")
        .attribute("y")
        .attribute("z")
}

fn transform() -> ClassDef {
    ClassDef::new("Transform")
        .method(
            "set_position",
            "set_position(self, pos: Vec3) -> None\nMove the object to an absolute position.",
        )
        .method(
            "set_rotation",
            "set_rotation(self, rot: Vec3) -> None\nSet Euler rotation in degrees.",
        )
        .method(
            "set_scale",
            "set_scale(self, scale: Vec3) -> None\nSet the per-axis scale.",
        )
        .method(
            "translate",
            "translate(self, offset: Vec3) -> None\nMove the object relative to its current position.",
        )
        .method(
            "rotate",
            "rotate(self, delta: Vec3) -> None\nAdd a rotation in degrees to the current rotation.",
        )
        .property(
            "position",
            "position -> Vec3\nCurrent position of the object.",
        )
}

fn entity() -> ClassDef {
    ClassDef::new("Entity")
        .extends("Transform")
        .method(
            "set_color",
            "set_color(self, color: Vec3) -> None\nSet the RGB color, each channel in 0..1.",
        )
        .method(
            "set_visible",
            "set_visible(self, visible: bool) -> None\nShow or hide the entity.",
        )
        .method("__repr__", "__repr__(self) -> str")
        .undocumented_method("_upload_mesh")
        .attribute("id")
}

fn concept_forge() -> ClassDef {
    ClassDef::new("ConceptForge")
        .method(
            "add_cube",
            "add_cube(self, pos: Vec3, rot: Vec3, scale: Vec3) -> Entity\nAdd a cube entity to the scene and return it.",
        )
        .method(
            "add_sphere",
            "add_sphere(self, pos: Vec3, radius: float) -> Entity\nAdd a sphere entity to the scene and return it.",
        )
        .method(
            "add_plane",
            "add_plane(self, pos: Vec3, size: float) -> Entity\nAdd a flat square plane facing up.",
        )
        .method(
            "remove_entity",
            "remove_entity(self, entity: Entity) -> bool\nRemove an entity from the scene. Returns False if it was not present.",
        )
        .method(
            "set_camera",
            "set_camera(self, pos: Vec3, target: Vec3) -> None\nPlace the camera and point it at a target.",
        )
        .method(
            "set_background",
            "set_background(self, color: Vec3) -> None\nSet the clear color of the window.",
        )
        .method(
            "time",
            "time(self) -> float\nSeconds elapsed since the forge was created.",
        )
        .method(
            "delta_time",
            "delta_time(self) -> float\nSeconds elapsed during the previous frame.",
        )
        .method(
            "window_should_close",
            "window_should_close(self) -> bool\nTrue once the user asked to close the window.",
        )
        .method(
            "calc_delta_time",
            "calc_delta_time(self) -> None\nUpdate the frame timer. Call once per frame.",
        )
        .method(
            "calc_projection",
            "calc_projection(self) -> None\nRecompute the projection matrix for the window size.",
        )
        .method(
            "gui_management",
            "gui_management(self) -> None\nDraw the debug GUI.",
        )
        .method(
            "process_input",
            "process_input(self) -> None\nPoll keyboard and mouse events.",
        )
        .method("render", "render(self) -> None\nDraw every entity and swap buffers.")
        .undocumented_method("_init_gl")
        .attribute("entities")
}
